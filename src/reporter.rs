use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::types::UserReport;

const RULE: &str = "─────────────";

/// Render the full rank report: an overall section followed by one section
/// per competition, ascending by competition id.
///
/// The formatter only presents what the engine already computed — every
/// delta comes straight out of the change records. Zero deltas render as
/// blank padding so unchanged rows stay aligned with moved ones.
pub fn format_report(reports: &[UserReport]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "📊 Overall Rankings");
    let _ = writeln!(out, "{RULE}");
    for (i, report) in reports.iter().enumerate() {
        let rank_change = format_int_change(report.change.overall_rank_diff);
        let points_change = format_float_change(report.change.points_diff);
        let _ = writeln!(out, "{}. {} (@{})", i + 1, report.name, report.username);
        let _ = writeln!(
            out,
            "└ #{:<3}{:<8} | {:<6.2}{:<8} | 🏅 {}",
            report.snapshot.rank,
            rank_change,
            report.snapshot.points,
            points_change,
            report.badge_name
        );
    }

    for (comp_id, comp_name) in competition_index(reports) {
        let _ = writeln!(out, "\n🎯 [{comp_id}] {comp_name}");
        let _ = writeln!(out, "{RULE}");
        for (i, report) in reports.iter().enumerate() {
            let Some(standing) = report
                .snapshot
                .competitions
                .iter()
                .find(|c| c.id == comp_id)
            else {
                continue;
            };
            let (rank_change, points_change) = match report.change.competitions.get(&comp_id) {
                Some(change) => (
                    format_int_change(change.rank_diff),
                    format_float_change(change.points_diff),
                ),
                None => (blank(), blank()),
            };
            let _ = writeln!(out, "{}. {} (@{})", i + 1, report.name, report.username);
            let _ = writeln!(
                out,
                "     #{:<3}{:<8} | {:<6.2}{:<8} | #{}/{} {:.5}",
                standing.rank,
                rank_change,
                standing.points,
                points_change,
                standing.weight_rank.unwrap_or(0),
                standing.total_weight_participants,
                standing.weight
            );
        }
    }

    out
}

/// Competition id → display name across every report, id ascending.
fn competition_index(reports: &[UserReport]) -> BTreeMap<i64, String> {
    let mut index = BTreeMap::new();
    for report in reports {
        for comp in &report.snapshot.competitions {
            index.entry(comp.id).or_insert_with(|| comp.name.clone());
        }
    }
    index
}

fn blank() -> String {
    "   ".to_string()
}

fn format_int_change(diff: i64) -> String {
    if diff == 0 {
        blank()
    } else if diff > 0 {
        format!("⬆{diff}")
    } else {
        format!("⬇{diff}")
    }
}

fn format_float_change(diff: f64) -> String {
    if diff == 0.0 {
        blank()
    } else if diff > 0.0 {
        format!("⬆{diff:.2}")
    } else {
        format!("⬇{diff:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeRecord, CompetitionChange, CompetitionStanding, UserSnapshot};
    use chrono::{TimeZone, Utc};

    fn report(
        name: &str,
        rank: i64,
        points: f64,
        competitions: Vec<CompetitionStanding>,
        change: ChangeRecord,
    ) -> UserReport {
        UserReport {
            address: format!("allo1{name}"),
            name: name.to_string(),
            username: name.to_lowercase(),
            badge_name: "Contender".to_string(),
            snapshot: UserSnapshot {
                timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
                rank,
                points,
                competitions,
            },
            change,
        }
    }

    fn standing(id: i64, rank: i64, points: f64) -> CompetitionStanding {
        CompetitionStanding {
            id,
            name: format!("comp {id}"),
            topic_id: id * 10,
            rank,
            points,
            weight: 0.02,
            weight_rank: Some(2),
            total_weight_participants: 10,
        }
    }

    #[test]
    fn overall_section_lists_users_in_order() {
        let text = format_report(&[
            report("Alice", 2, 50.0, vec![], ChangeRecord::default()),
            report("Bob", 9, 3.0, vec![], ChangeRecord::default()),
        ]);
        let alice = text.find("1. Alice (@alice)").unwrap();
        let bob = text.find("2. Bob (@bob)").unwrap();
        assert!(alice < bob);
        assert!(text.contains("🏅 Contender"));
    }

    #[test]
    fn improvement_shows_up_arrow() {
        let change = ChangeRecord {
            overall_rank_changed: true,
            overall_rank_diff: 2,
            points_diff: 2.5,
            competitions: BTreeMap::new(),
        };
        let text = format_report(&[report("Alice", 3, 12.5, vec![], change)]);
        assert!(text.contains("⬆2"));
        assert!(text.contains("⬆2.50"));
    }

    #[test]
    fn decline_shows_down_arrow() {
        let change = ChangeRecord {
            overall_rank_changed: true,
            overall_rank_diff: -3,
            points_diff: -0.5,
            competitions: BTreeMap::new(),
        };
        let text = format_report(&[report("Alice", 8, 9.5, vec![], change)]);
        assert!(text.contains("⬇-3"));
        assert!(text.contains("⬇-0.50"));
    }

    #[test]
    fn competition_sections_ascend_by_id() {
        let text = format_report(&[report(
            "Alice",
            2,
            50.0,
            vec![standing(7, 1, 1.0), standing(2, 4, 0.2)],
            ChangeRecord::default(),
        )]);
        let first = text.find("🎯 [2] comp 2").unwrap();
        let second = text.find("🎯 [7] comp 7").unwrap();
        assert!(first < second);
    }

    #[test]
    fn competition_line_includes_weight_standing() {
        let mut change = ChangeRecord::default();
        change.competitions.insert(
            1,
            CompetitionChange {
                rank_changed: true,
                rank_diff: 1,
                points_diff: 0.5,
                weight_diff: 0.01,
                weight_rank_diff: 2,
            },
        );
        let text = format_report(&[report("Alice", 3, 12.5, vec![standing(1, 2, 2.5)], change)]);
        assert!(text.contains("#2/10 0.02000"));
        assert!(text.contains("⬆1"));
        assert!(text.contains("⬆0.50"));
    }

    #[test]
    fn user_absent_from_competition_is_skipped_in_its_section() {
        let text = format_report(&[
            report("Alice", 2, 50.0, vec![standing(1, 1, 1.0)], ChangeRecord::default()),
            report("Bob", 9, 3.0, vec![], ChangeRecord::default()),
        ]);
        let section = &text[text.find("🎯 [1]").unwrap()..];
        assert!(section.contains("Alice"));
        assert!(!section.contains("Bob"));
    }
}
