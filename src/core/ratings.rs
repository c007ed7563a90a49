use crate::domain::model::{RankedItem, RatingLedger, Score};
use crate::domain::ports::{Clock, LedgerStore};
use crate::utils::error::Result;
use futures::future::join_all;
use std::sync::Arc;

/// Maintains per-item vote ledgers and derives leaderboards from them.
///
/// Votes are idempotent upserts keyed by voter id: re-voting overwrites,
/// never double-counts. Derived statistics are recomputed from the full
/// vote map on every mutation.
pub struct RatingAggregator<L: LedgerStore, K: Clock> {
    ledgers: Arc<L>,
    clock: Arc<K>,
}

impl<L: LedgerStore, K: Clock> RatingAggregator<L, K> {
    pub fn new(ledgers: Arc<L>, clock: Arc<K>) -> Self {
        Self { ledgers, clock }
    }

    /// Upsert `voter_id -> score` on the item's ledger, creating the
    /// ledger on first vote. Two clients racing on the first vote can
    /// both create one; the duplicate is logged, not masked, and heals
    /// through subsequent idempotent upserts against the first copy.
    pub async fn record_vote(&self, item_id: &str, voter_id: &str, score: Score) -> Result<()> {
        let now = self.clock.now();
        let mut existing = self.ledgers.ledgers_for_item(item_id).await?;

        if existing.len() > 1 {
            tracing::warn!(
                "Item {} has {} rating ledgers; using the first",
                item_id,
                existing.len()
            );
        }

        let ledger = match existing.first_mut() {
            Some(ledger) => {
                ledger.votes.insert(voter_id.to_string(), score);
                ledger.recompute(now);
                ledger.clone()
            }
            None => RatingLedger::new(item_id, voter_id, score, now),
        };

        tracing::debug!(
            "Recording vote {} by {} on {} ({} votes total)",
            score.value(),
            voter_id,
            item_id,
            ledger.vote_count
        );
        self.ledgers.upsert_ledger(ledger).await
    }

    /// Remove one voter's entry from every ledger that has it. Ledgers
    /// left with no votes are deleted outright. Returns the number of
    /// ledgers touched. The writes are an unordered non-atomic batch.
    pub async fn withdraw_voter(&self, voter_id: &str) -> Result<usize> {
        let now = self.clock.now();
        let all = self.ledgers.all_ledgers().await?;

        let affected: Vec<RatingLedger> = all
            .into_iter()
            .filter(|l| l.votes.contains_key(voter_id))
            .collect();

        if affected.is_empty() {
            return Ok(0);
        }

        tracing::info!(
            "Withdrawing voter {} from {} ledgers",
            voter_id,
            affected.len()
        );

        let results = join_all(affected.into_iter().map(|mut ledger| {
            let ledgers = Arc::clone(&self.ledgers);
            let voter_id = voter_id.to_string();
            async move {
                ledger.votes.remove(&voter_id);
                if ledger.votes.is_empty() {
                    ledgers.delete_ledger(&ledger.item_id).await
                } else {
                    ledger.recompute(now);
                    ledgers.upsert_ledger(ledger).await
                }
            }
        }))
        .await;

        let mut touched = 0;
        let mut first_err = None;
        for result in results {
            match result {
                Ok(()) => touched += 1,
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        if let Some(e) = first_err {
            tracing::warn!(
                "Withdrawal batch for {} partially failed after {} writes: {}",
                voter_id,
                touched,
                e
            );
            return Err(e);
        }
        Ok(touched)
    }

    /// Rank ledgers by average score descending, ties broken by total
    /// points descending. Ranks are 1..=N and strictly increasing even
    /// for exact ties.
    pub fn rank(&self, mut ledgers: Vec<RatingLedger>) -> Vec<RankedItem> {
        ledgers.sort_by(|a, b| {
            b.average_score
                .total_cmp(&a.average_score)
                .then(b.total_points.total_cmp(&a.total_points))
        });

        ledgers
            .into_iter()
            .enumerate()
            .map(|(idx, ledger)| RankedItem {
                rank: idx + 1,
                item_id: ledger.item_id,
                average_score: ledger.average_score,
                total_points: ledger.total_points,
                vote_count: ledger.vote_count,
            })
            .collect()
    }
}
