use crate::domain::ports::MarkerStore;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const CATALOG_DOMAIN: &str = "catalog";
pub const RATINGS_DOMAIN: &str = "ratings";

/// Per-domain last-modified timestamps in the remote store. Writers
/// touch their domain after every successful mutation; readers compare
/// the timestamp against their local fetch time.
pub struct MarkerClient<M: MarkerStore> {
    store: Arc<M>,
}

impl<M: MarkerStore> MarkerClient<M> {
    pub fn new(store: Arc<M>) -> Self {
        Self { store }
    }

    pub async fn last_modified(&self, domain: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .store
            .marker(domain)
            .await?
            .map(|m| m.last_modified_at))
    }

    /// Stamp the domain with server time. Failures are logged and
    /// propagated; the data write that preceded this has already landed.
    pub async fn touch(&self, domain: &str) -> Result<()> {
        if let Err(e) = self.store.touch(domain).await {
            tracing::warn!("Failed to touch marker for {}: {}", domain, e);
            return Err(e);
        }
        tracing::debug!("Touched marker for {}", domain);
        Ok(())
    }
}
