pub mod cache;
pub mod catalog;
pub mod markers;
pub mod ordinal;
pub mod ratings;

pub use crate::domain::model::{CatalogItem, RankedItem, RatingLedger, Score, Tier};
pub use crate::domain::ports::{Clock, ItemStore, LedgerStore, LocalStore, MarkerStore};
pub use crate::utils::error::Result;
