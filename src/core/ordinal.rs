use crate::domain::model::Tier;
use crate::domain::ports::ItemStore;
use crate::utils::error::Result;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// An ordinal assignment. When `requires_reorganize` is set the carried
/// ordinal is the elevated-tier boundary: inserting there without a
/// `reorganize()` pass first would collide with an elevated item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrdinalSlot {
    pub ordinal: u32,
    pub requires_reorganize: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorganizeReport {
    pub total_items: usize,
    pub writes: usize,
}

/// Assigns and repairs display ordinals under the two-tier invariant:
/// ordinals are unique, and every regular item sorts before every
/// elevated item.
pub struct OrdinalAllocator<S: ItemStore> {
    store: Arc<S>,
}

impl<S: ItemStore> OrdinalAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn next_ordinal(&self, tier: Tier) -> Result<OrdinalSlot> {
        let items = self.store.all_items().await?;
        let used: HashSet<u32> = items.iter().map(|i| i.ordinal).collect();

        if used.len() < items.len() {
            tracing::warn!(
                "Duplicate ordinals in storage ({} items, {} distinct ordinals); run reorganize",
                items.len(),
                used.len()
            );
        }

        match tier {
            Tier::Regular => {
                let boundary = self
                    .store
                    .elevated_items()
                    .await?
                    .iter()
                    .map(|i| i.ordinal)
                    .min();

                let mut candidate = 1u32;
                loop {
                    if let Some(boundary) = boundary {
                        if candidate >= boundary {
                            // Every slot below the elevated block is taken.
                            tracing::debug!(
                                "No regular gap below boundary {}; reorganize needed",
                                boundary
                            );
                            return Ok(OrdinalSlot {
                                ordinal: boundary,
                                requires_reorganize: true,
                            });
                        }
                    }
                    if !used.contains(&candidate) {
                        return Ok(OrdinalSlot {
                            ordinal: candidate,
                            requires_reorganize: false,
                        });
                    }
                    candidate += 1;
                }
            }
            Tier::Elevated => {
                let max_regular = items
                    .iter()
                    .filter(|i| i.tier == Tier::Regular)
                    .map(|i| i.ordinal)
                    .max()
                    .unwrap_or(0);

                let mut candidate = max_regular + 1;
                while used.contains(&candidate) {
                    candidate += 1;
                }
                Ok(OrdinalSlot {
                    ordinal: candidate,
                    requires_reorganize: false,
                })
            }
        }
    }

    /// Repair pass: regular items get 1..=R, elevated items R+1..=R+E,
    /// both in their current ordinal order. Only changed items are
    /// written; the writes go out as an unordered, non-atomic batch.
    /// A partial failure leaves a converging state: re-invoking is safe.
    pub async fn reorganize(&self) -> Result<ReorganizeReport> {
        let items = self.store.all_items().await?;
        let total_items = items.len();

        let (mut regular, mut elevated): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|i| i.tier == Tier::Regular);
        regular.sort_by_key(|i| i.ordinal);
        elevated.sort_by_key(|i| i.ordinal);

        let changes: Vec<(String, u32)> = regular
            .iter()
            .chain(elevated.iter())
            .enumerate()
            .filter_map(|(idx, item)| {
                let target = (idx + 1) as u32;
                (item.ordinal != target).then(|| (item.id.clone(), target))
            })
            .collect();

        if changes.is_empty() {
            tracing::debug!("Reorganize: all {} ordinals already dense", total_items);
            return Ok(ReorganizeReport {
                total_items,
                writes: 0,
            });
        }

        tracing::info!(
            "Reorganize: rewriting {} of {} ordinals",
            changes.len(),
            total_items
        );

        let results = join_all(
            changes
                .iter()
                .map(|(id, ordinal)| self.store.set_ordinal(id, *ordinal)),
        )
        .await;

        let mut writes = 0;
        let mut first_err = None;
        for result in results {
            match result {
                Ok(()) => writes += 1,
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_err {
            tracing::warn!(
                "Reorganize batch partially failed ({}/{} writes applied): {}",
                writes,
                changes.len(),
                e
            );
            return Err(e);
        }

        Ok(ReorganizeReport { total_items, writes })
    }
}
