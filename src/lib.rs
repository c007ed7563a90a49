pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{CliConfig, Command, Settings};
pub use core::cache::{CacheConfig, StalenessCache};
pub use core::catalog::{CatalogService, LeaderboardScope, NewItem};
pub use core::ordinal::{OrdinalAllocator, OrdinalSlot, ReorganizeReport};
pub use core::ratings::RatingAggregator;
pub use domain::model::{points_of, CatalogItem, RankedItem, RatingLedger, Score, Tier};
pub use utils::error::{CatalogError, Result};
