use crate::domain::model::{CatalogItem, ModificationMarker, RatingLedger};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Catalog item documents in the remote store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items, ascending by ordinal.
    async fn all_items(&self) -> Result<Vec<CatalogItem>>;

    async fn elevated_items(&self) -> Result<Vec<CatalogItem>>;

    async fn insert_item(&self, item: CatalogItem) -> Result<()>;

    async fn set_ordinal(&self, id: &str, ordinal: u32) -> Result<()>;

    async fn delete_item(&self, id: &str) -> Result<()>;
}

/// Rating ledger documents in the remote store.
///
/// `ledgers_for_item` returns a Vec on purpose: two clients racing on the
/// first vote for an item can both create a ledger, and callers need to
/// see the duplicate rather than have it masked.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn ledgers_for_item(&self, item_id: &str) -> Result<Vec<RatingLedger>>;

    async fn all_ledgers(&self) -> Result<Vec<RatingLedger>>;

    async fn upsert_ledger(&self, ledger: RatingLedger) -> Result<()>;

    async fn delete_ledger(&self, item_id: &str) -> Result<()>;
}

/// Per-domain modification markers. `touch` assigns server time so the
/// timestamps are comparable across clients with skewed local clocks.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn marker(&self, domain: &str) -> Result<Option<ModificationMarker>>;

    async fn touch(&self, domain: &str) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn store_endpoint(&self) -> &str;
    fn cache_ttl_secs(&self) -> i64;
    fn check_interval_secs(&self) -> i64;
}

/// Process-local key-value storage for cache entries. Never shared
/// across clients.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn delete(&self, key: &str);
}

/// Client-local time source, injectable for deterministic tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
