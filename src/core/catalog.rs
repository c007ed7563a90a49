use crate::core::cache::{CacheConfig, StalenessCache};
use crate::core::markers::{MarkerClient, CATALOG_DOMAIN, RATINGS_DOMAIN};
use crate::core::ordinal::{OrdinalAllocator, ReorganizeReport};
use crate::core::ratings::RatingAggregator;
use crate::domain::model::{CatalogItem, RankedItem, RatingLedger, Score, Tier};
use crate::domain::ports::{Clock, ItemStore, LedgerStore, LocalStore, MarkerStore};
use crate::utils::error::{CatalogError, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Attributes supplied by the external add operation; the ordinal is
/// allocated internally.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub creator: String,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub enum LeaderboardScope {
    Global,
    Creator(String),
}

/// Public face of the catalog core. Owns the allocator, aggregator,
/// markers and cache; every mutating operation touches its domain's
/// marker and clears the local cache so the writer's next read is fresh
/// without waiting on the poll interval.
pub struct CatalogService<I, L, M, S, K>
where
    I: ItemStore,
    L: LedgerStore,
    M: MarkerStore,
    S: LocalStore,
    K: Clock,
{
    items: Arc<I>,
    allocator: OrdinalAllocator<I>,
    aggregator: RatingAggregator<L, K>,
    markers: MarkerClient<M>,
    cache: StalenessCache<S, M, K>,
    ledgers: Arc<L>,
}

impl<I, L, M, S, K> CatalogService<I, L, M, S, K>
where
    I: ItemStore,
    L: LedgerStore,
    M: MarkerStore,
    S: LocalStore,
    K: Clock,
{
    pub fn new(
        items: Arc<I>,
        ledgers: Arc<L>,
        markers: Arc<M>,
        local: Arc<S>,
        clock: Arc<K>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            allocator: OrdinalAllocator::new(items.clone()),
            aggregator: RatingAggregator::new(ledgers.clone(), clock.clone()),
            markers: MarkerClient::new(markers.clone()),
            cache: StalenessCache::new(local, markers, clock, cache_config),
            items,
            ledgers,
        }
    }

    /// Create a catalog item at the next ordinal for its tier. When the
    /// allocator signals that the slot sits on the elevated boundary the
    /// item is inserted there anyway and a reorganize pass runs right
    /// after, shifting the elevated block up and restoring uniqueness.
    pub async fn add_item(&self, tier: Tier, attributes: NewItem) -> Result<String> {
        let slot = self.allocator.next_ordinal(tier).await?;
        let id = uuid::Uuid::new_v4().to_string();

        let item = CatalogItem {
            id: id.clone(),
            ordinal: slot.ordinal,
            tier,
            name: attributes.name,
            creator: attributes.creator,
            image_ref: attributes.image_ref,
        };

        tracing::info!(
            "Adding {:?} item {} at ordinal {}{}",
            tier,
            id,
            slot.ordinal,
            if slot.requires_reorganize {
                " (boundary slot, reorganizing)"
            } else {
                ""
            }
        );

        self.items.insert_item(item).await?;
        // The insert is committed: drop the local copy now so a failed
        // reorganize or marker touch cannot leave this client serving
        // its own stale catalog.
        self.cache.invalidate(CATALOG_DOMAIN);

        if slot.requires_reorganize {
            self.allocator.reorganize().await?;
        }

        self.markers.touch(CATALOG_DOMAIN).await?;
        Ok(id)
    }

    pub async fn cast_vote(&self, item_id: &str, voter_id: &str, score: f64) -> Result<()> {
        let score = Score::new(score)?;
        self.aggregator.record_vote(item_id, voter_id, score).await?;
        self.cache.invalidate(RATINGS_DOMAIN);
        self.markers.touch(RATINGS_DOMAIN).await?;
        Ok(())
    }

    /// Bulk removal of one voter across every ledger. Destructive, so it
    /// demands the exact confirmation token; a mismatch fails hard with
    /// no partial execution.
    pub async fn withdraw_voter(&self, voter_id: &str, confirmation: &str) -> Result<usize> {
        let expected = format!("withdraw {}", voter_id);
        if confirmation != expected {
            return Err(CatalogError::ConfirmationRequired { expected });
        }

        // The batch is not atomic; even a partial failure may have
        // committed writes, so the local copy goes either way.
        let outcome = self.aggregator.withdraw_voter(voter_id).await;
        self.cache.invalidate(RATINGS_DOMAIN);
        let touched = outcome?;

        if touched > 0 {
            self.markers.touch(RATINGS_DOMAIN).await?;
        }
        Ok(touched)
    }

    /// Delete an item and its ledger. The ordinal is not reclaimed; the
    /// gap stays until the next reorganize pass.
    pub async fn remove_item(&self, item_id: &str, confirmation: &str) -> Result<()> {
        let expected = format!("remove {}", item_id);
        if confirmation != expected {
            return Err(CatalogError::ConfirmationRequired { expected });
        }

        tracing::info!("Removing item {} and its ledger", item_id);
        self.items.delete_item(item_id).await?;
        self.cache.invalidate(CATALOG_DOMAIN);
        self.ledgers.delete_ledger(item_id).await?;
        self.cache.invalidate(RATINGS_DOMAIN);

        self.markers.touch(CATALOG_DOMAIN).await?;
        self.markers.touch(RATINGS_DOMAIN).await?;
        Ok(())
    }

    /// Cached catalog read, ascending by ordinal. Degrades to an empty
    /// list when the remote store is unreachable.
    pub async fn get_catalog(&self) -> Vec<CatalogItem> {
        let result = self
            .cache
            .read(CATALOG_DOMAIN, || self.items.all_items())
            .await;

        match result {
            Ok(items) => items,
            Err(e) => {
                if e.is_remote() {
                    tracing::warn!("Catalog unreachable, returning empty: {}", e);
                } else {
                    tracing::error!("Catalog read failed, returning empty: {}", e);
                }
                Vec::new()
            }
        }
    }

    /// Cached leaderboard. `Creator` scope ranks one creator's items only
    /// against each other. Degrades to empty on remote failure.
    pub async fn get_leaderboard(&self, scope: LeaderboardScope) -> Vec<RankedItem> {
        let ledgers: Vec<RatingLedger> = match self
            .cache
            .read(RATINGS_DOMAIN, || self.ledgers.all_ledgers())
            .await
        {
            Ok(ledgers) => ledgers,
            Err(e) => {
                if e.is_remote() {
                    tracing::warn!("Ledgers unreachable, returning empty: {}", e);
                } else {
                    tracing::error!("Leaderboard read failed, returning empty: {}", e);
                }
                return Vec::new();
            }
        };

        let ledgers = match scope {
            LeaderboardScope::Global => ledgers,
            LeaderboardScope::Creator(creator) => {
                let items = self.get_catalog().await;
                let owned: HashSet<String> = items
                    .into_iter()
                    .filter(|i| i.creator == creator)
                    .map(|i| i.id)
                    .collect();
                ledgers
                    .into_iter()
                    .filter(|l| owned.contains(&l.item_id))
                    .collect()
            }
        };

        self.aggregator.rank(ledgers)
    }

    pub async fn force_reorganize(&self) -> Result<ReorganizeReport> {
        // A partially failed pass has still rewritten some ordinals.
        let outcome = self.allocator.reorganize().await;
        self.cache.invalidate(CATALOG_DOMAIN);
        let report = outcome?;

        if report.writes > 0 {
            self.markers.touch(CATALOG_DOMAIN).await?;
        }
        Ok(report)
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}
