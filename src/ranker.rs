use crate::api::InfererWeight;
use crate::types::WeightRankEntry;

/// Dense descending weight ranking for one topic.
///
/// Built once per topic per pass; every address's standing is then a lookup,
/// so the O(W log W) sort is paid once no matter how many addresses share a
/// competition.
#[derive(Debug, Clone, Default)]
pub struct WeightBoard {
    entries: Vec<WeightRankEntry>,
}

impl WeightBoard {
    /// Rank a raw weight set: highest weight gets rank 1, every entry gets a
    /// distinct rank in `1..=N`.
    ///
    /// Weights arrive as decimal text; a value that fails to parse counts as
    /// 0.0 rather than aborting the ranking. The sort is stable, so tied
    /// weights keep their upstream order and still receive sequential ranks.
    pub fn from_raw(raw: &[InfererWeight]) -> Self {
        let mut entries: Vec<WeightRankEntry> = raw
            .iter()
            .map(|w| WeightRankEntry {
                worker: w.worker.clone(),
                weight: w.weight.parse().unwrap_or(0.0),
                rank: 0,
            })
            .collect();

        entries.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = (i + 1) as u32;
        }

        Self { entries }
    }

    /// Number of workers reporting a weight for this topic.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranked entries, best first.
    pub fn entries(&self) -> &[WeightRankEntry] {
        &self.entries
    }

    /// The ranked entry for a specific worker, if it reported a weight.
    pub fn standing(&self, worker: &str) -> Option<&WeightRankEntry> {
        self.entries.iter().find(|e| e.worker == worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> Vec<InfererWeight> {
        pairs
            .iter()
            .map(|(worker, weight)| InfererWeight {
                worker: worker.to_string(),
                weight: weight.to_string(),
            })
            .collect()
    }

    #[test]
    fn empty_input() {
        let board = WeightBoard::from_raw(&[]);
        assert!(board.is_empty());
        assert!(board.standing("w1").is_none());
    }

    #[test]
    fn ranks_are_a_permutation() {
        let board = WeightBoard::from_raw(&raw(&[
            ("w1", "0.3"),
            ("w2", "0.1"),
            ("w3", "0.9"),
            ("w4", "0.5"),
        ]));
        let mut ranks: Vec<u32> = board.entries().iter().map(|e| e.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
    }

    #[test]
    fn higher_weight_ranks_better() {
        let board = WeightBoard::from_raw(&raw(&[("low", "0.1"), ("high", "0.9")]));
        let high = board.standing("high").unwrap();
        let low = board.standing("low").unwrap();
        assert_eq!(high.rank, 1);
        assert_eq!(low.rank, 2);
        for a in board.entries() {
            for b in board.entries() {
                if a.weight > b.weight {
                    assert!(a.rank < b.rank);
                }
            }
        }
    }

    #[test]
    fn stable_tie_break_preserves_input_order() {
        let board = WeightBoard::from_raw(&raw(&[
            ("w1", "0.5"),
            ("w2", "0.8"),
            ("w3", "0.8"),
        ]));
        assert_eq!(board.standing("w2").unwrap().rank, 1);
        assert_eq!(board.standing("w3").unwrap().rank, 2);
        assert_eq!(board.standing("w1").unwrap().rank, 3);
    }

    #[test]
    fn malformed_weight_counts_as_zero() {
        let board = WeightBoard::from_raw(&raw(&[
            ("ok", "0.2"),
            ("bad", "not-a-number"),
        ]));
        let bad = board.standing("bad").unwrap();
        assert_eq!(bad.weight, 0.0);
        assert_eq!(bad.rank, 2);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn duplicate_workers_both_ranked() {
        let board = WeightBoard::from_raw(&raw(&[("w1", "0.4"), ("w1", "0.6")]));
        assert_eq!(board.len(), 2);
        // Lookup finds the better-ranked occurrence first
        assert_eq!(board.standing("w1").unwrap().rank, 1);
    }
}
