use std::collections::BTreeMap;

use crate::types::{ChangeRecord, CompetitionChange, UserSnapshot};

/// Diff a fresh snapshot against the previous one.
///
/// With no previous snapshot there is nothing to compare against and the
/// default (all flags false, all deltas zero) record is returned.
///
/// Rank deltas are `previous − current`, so a positive delta means the rank
/// improved; point and weight deltas are `current − previous`. Competitions
/// present now but absent before contribute no entry: no prior data is not
/// a change. Matching is by competition id, first match wins.
pub fn detect(current: &UserSnapshot, previous: Option<&UserSnapshot>) -> ChangeRecord {
    let Some(prev) = previous else {
        return ChangeRecord::default();
    };

    let mut competitions = BTreeMap::new();
    for comp in &current.competitions {
        let Some(old) = prev.competitions.iter().find(|c| c.id == comp.id) else {
            continue;
        };
        competitions.insert(
            comp.id,
            CompetitionChange {
                rank_changed: old.rank != comp.rank,
                rank_diff: old.rank - comp.rank,
                points_diff: comp.points - old.points,
                weight_diff: comp.weight - old.weight,
                weight_rank_diff: i64::from(old.weight_rank.unwrap_or(0))
                    - i64::from(comp.weight_rank.unwrap_or(0)),
            },
        );
    }

    ChangeRecord {
        overall_rank_changed: prev.rank != current.rank,
        overall_rank_diff: prev.rank - current.rank,
        points_diff: current.points - prev.points,
        competitions,
    }
}
