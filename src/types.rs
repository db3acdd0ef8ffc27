use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One competition's standing for one address at capture time.
///
/// `weight_rank` is the dense rank of the address's weight among all workers
/// reporting a weight for the competition's topic, or `None` when the address
/// has no weight record there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionStanding {
    pub id: i64,
    pub name: String,
    pub topic_id: i64,
    pub rank: i64,
    pub points: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub weight_rank: Option<u32>,
    #[serde(default)]
    pub total_weight_participants: u32,
}

/// One address's complete picture at a point in time.
///
/// Persisted wholesale by the snapshot store and replaced on every successful
/// pass; `competitions` is kept sorted by competition id once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub timestamp: DateTime<Utc>,
    pub rank: i64,
    pub points: f64,
    pub competitions: Vec<CompetitionStanding>,
}

/// Structured diff between two consecutive snapshots of one address.
///
/// Transient: built fresh each pass and consumed by the report formatter,
/// never persisted. An absent previous snapshot yields the default value
/// (no flags set, all deltas zero, no competition entries).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChangeRecord {
    pub overall_rank_changed: bool,
    /// previous rank − current rank; positive means the rank improved.
    pub overall_rank_diff: i64,
    /// current points − previous points.
    pub points_diff: f64,
    /// Keyed by competition id; competitions with no prior data have no entry.
    pub competitions: BTreeMap<i64, CompetitionChange>,
}

/// Per-competition slice of a [`ChangeRecord`]. Same sign conventions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionChange {
    pub rank_changed: bool,
    pub rank_diff: i64,
    pub points_diff: f64,
    pub weight_diff: f64,
    pub weight_rank_diff: i64,
}

/// One worker's entry in a per-topic weight ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightRankEntry {
    pub worker: String,
    pub weight: f64,
    /// 1-based dense rank, highest weight first.
    pub rank: u32,
}

/// Everything the formatter needs for one address: identity, the fresh
/// snapshot and its diff against the previous one.
#[derive(Debug, Clone)]
pub struct UserReport {
    pub address: String,
    pub name: String,
    pub username: String,
    pub badge_name: String,
    pub snapshot: UserSnapshot,
    pub change: ChangeRecord,
}

/// Result of one batch pass over the configured address list, sorted by
/// overall rank ascending. Addresses whose fetch failed are absent.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<UserReport>,
}

impl BatchOutcome {
    /// A pass is worth notifying about only when some tracked address moved
    /// in rank, overall or within a competition. Point or weight movement
    /// alone does not qualify.
    pub fn notification_worthy(&self) -> bool {
        self.reports.iter().any(|r| {
            r.change.overall_rank_changed
                || r.change.competitions.values().any(|c| c.rank_changed)
        })
    }
}
