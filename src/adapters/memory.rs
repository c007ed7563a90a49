use crate::domain::model::{CatalogItem, ModificationMarker, RatingLedger, Tier};
use crate::domain::ports::{Clock, ItemStore, LedgerStore, LocalStore, MarkerStore};
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory document store for tests and demo mode. Implements all
/// three remote-store ports against process-local maps; `set_offline`
/// simulates an unreachable remote.
pub struct MemoryStore {
    items: Mutex<Vec<CatalogItem>>,
    ledgers: Mutex<Vec<RatingLedger>>,
    markers: Mutex<HashMap<String, ModificationMarker>>,
    clock: Arc<dyn Clock>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            ledgers: Mutex::new(Vec::new()),
            markers: Mutex::new(HashMap::new()),
            clock,
            offline: AtomicBool::new(false),
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(CatalogError::RemoteUnavailable("store offline".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn all_items(&self) -> Result<Vec<CatalogItem>> {
        self.check_online()?;
        let mut items = self.items.lock().expect("items lock").clone();
        items.sort_by_key(|i| i.ordinal);
        Ok(items)
    }

    async fn elevated_items(&self) -> Result<Vec<CatalogItem>> {
        self.check_online()?;
        Ok(self
            .items
            .lock()
            .expect("items lock")
            .iter()
            .filter(|i| i.tier == Tier::Elevated)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, item: CatalogItem) -> Result<()> {
        self.check_online()?;
        self.items.lock().expect("items lock").push(item);
        Ok(())
    }

    async fn set_ordinal(&self, id: &str, ordinal: u32) -> Result<()> {
        self.check_online()?;
        let mut items = self.items.lock().expect("items lock");
        match items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.ordinal = ordinal;
                Ok(())
            }
            None => Err(CatalogError::ItemNotFound(id.to_string())),
        }
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        self.check_online()?;
        self.items.lock().expect("items lock").retain(|i| i.id != id);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ledgers_for_item(&self, item_id: &str) -> Result<Vec<RatingLedger>> {
        self.check_online()?;
        Ok(self
            .ledgers
            .lock()
            .expect("ledgers lock")
            .iter()
            .filter(|l| l.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn all_ledgers(&self) -> Result<Vec<RatingLedger>> {
        self.check_online()?;
        Ok(self.ledgers.lock().expect("ledgers lock").clone())
    }

    async fn upsert_ledger(&self, ledger: RatingLedger) -> Result<()> {
        self.check_online()?;
        let mut ledgers = self.ledgers.lock().expect("ledgers lock");
        match ledgers.iter_mut().find(|l| l.item_id == ledger.item_id) {
            Some(existing) => *existing = ledger,
            None => ledgers.push(ledger),
        }
        Ok(())
    }

    async fn delete_ledger(&self, item_id: &str) -> Result<()> {
        self.check_online()?;
        self.ledgers
            .lock()
            .expect("ledgers lock")
            .retain(|l| l.item_id != item_id);
        Ok(())
    }
}

#[async_trait]
impl MarkerStore for MemoryStore {
    async fn marker(&self, domain: &str) -> Result<Option<ModificationMarker>> {
        self.check_online()?;
        Ok(self
            .markers
            .lock()
            .expect("markers lock")
            .get(domain)
            .cloned())
    }

    async fn touch(&self, domain: &str) -> Result<()> {
        self.check_online()?;
        // The injected clock stands in for server-assigned time here.
        let marker = ModificationMarker {
            domain: domain.to_string(),
            last_modified_at: self.clock.now(),
        };
        self.markers
            .lock()
            .expect("markers lock")
            .insert(domain.to_string(), marker);
        Ok(())
    }
}

/// Process-local key-value store backing the staleness cache.
#[derive(Default)]
pub struct MemoryLocalStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().expect("local store lock").get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.entries
            .lock()
            .expect("local store lock")
            .insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.entries.lock().expect("local store lock").remove(key);
    }
}

/// Hand-cranked clock for deterministic cache tests.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}
