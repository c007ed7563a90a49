use crate::utils::error::{CatalogError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Display partition for catalog items. Every `Regular` item must sort
/// before every `Elevated` item (legendary-class entries and the like).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Regular,
    Elevated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub ordinal: u32,
    pub tier: Tier,
    pub name: String,
    pub creator: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// A vote score: half-integer steps in 0.5..=10.0, stored as the number
/// of half-steps so equality and hashing stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(u8);

impl Score {
    pub fn new(value: f64) -> Result<Self> {
        let half_steps = value * 2.0;
        if half_steps.fract() == 0.0 && (1.0..=20.0).contains(&half_steps) {
            Ok(Score(half_steps as u8))
        } else {
            Err(CatalogError::InvalidScore { value })
        }
    }

    pub fn value(&self) -> f64 {
        f64::from(self.0) / 2.0
    }

    pub fn points(&self) -> f64 {
        points_of(self.value())
    }
}

impl TryFrom<f64> for Score {
    type Error = CatalogError;

    fn try_from(value: f64) -> Result<Self> {
        Score::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> f64 {
        score.value()
    }
}

/// Fixed score-to-points table. Super-linear so high scores weigh more in
/// tie-breaks. Anything outside the table maps to 0 points rather than
/// erroring.
pub fn points_of(score: f64) -> f64 {
    let half_steps = score * 2.0;
    if half_steps.fract() != 0.0 {
        return 0.0;
    }
    match half_steps as i64 {
        1 => 5.0,
        2 => 10.0,
        3 => 12.5,
        4 => 15.0,
        5 => 18.0,
        6 => 21.0,
        7 => 24.5,
        8 => 28.0,
        9 => 32.0,
        10 => 36.0,
        11 => 40.5,
        12 => 45.0,
        13 => 50.0,
        14 => 55.0,
        15 => 60.5,
        16 => 66.0,
        17 => 72.0,
        18 => 78.0,
        19 => 84.5,
        20 => 91.0,
        _ => 0.0,
    }
}

/// Derived ledger statistics, always recomputed from the full vote map.
/// Never incremented in place; that is what keeps them from drifting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerTotals {
    pub average_score: f64,
    pub total_points: f64,
    pub vote_count: usize,
}

impl LedgerTotals {
    pub fn compute(votes: &HashMap<String, Score>) -> Self {
        let vote_count = votes.len();
        let total_points = votes.values().map(Score::points).sum();
        let average_score = if vote_count == 0 {
            0.0
        } else {
            votes.values().map(Score::value).sum::<f64>() / vote_count as f64
        };
        LedgerTotals {
            average_score,
            total_points,
            vote_count,
        }
    }
}

/// Per-item record of every voter's score plus derived statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingLedger {
    pub item_id: String,
    pub votes: HashMap<String, Score>,
    pub average_score: f64,
    pub total_points: f64,
    pub vote_count: usize,
    pub last_updated: DateTime<Utc>,
}

impl RatingLedger {
    pub fn new(item_id: &str, voter_id: &str, score: Score, now: DateTime<Utc>) -> Self {
        let mut votes = HashMap::new();
        votes.insert(voter_id.to_string(), score);
        let mut ledger = RatingLedger {
            item_id: item_id.to_string(),
            votes,
            average_score: 0.0,
            total_points: 0.0,
            vote_count: 0,
            last_updated: now,
        };
        ledger.recompute(now);
        ledger
    }

    /// Refresh the derived fields from the complete vote map.
    pub fn recompute(&mut self, now: DateTime<Utc>) {
        let totals = LedgerTotals::compute(&self.votes);
        self.average_score = totals.average_score;
        self.total_points = totals.total_points;
        self.vote_count = totals.vote_count;
        self.last_updated = now;
    }
}

/// Server-timestamped change signal, one per invalidation domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModificationMarker {
    pub domain: String,
    pub last_modified_at: DateTime<Utc>,
}

/// One entry on a leaderboard. Ranks are strictly increasing even for
/// exact ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedItem {
    pub rank: usize,
    pub item_id: String,
    pub average_score: f64,
    pub total_points: f64,
    pub vote_count: usize,
}
