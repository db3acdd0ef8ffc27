use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::api::{ForgeApi, UserRecord};
use crate::detector;
use crate::ranker::WeightBoard;
use crate::store::SnapshotStore;
use crate::types::{BatchOutcome, CompetitionStanding, UserReport, UserSnapshot};

/// Run one batch pass over the configured address list.
///
/// Per-address failures are isolated: an address whose user fetch or history
/// load fails is logged and dropped from this pass, the rest proceed. A topic
/// whose weight fetch fails only blanks that competition's weight fields.
///
/// Snapshots for every processed address are persisted before returning,
/// whether or not the pass turns out to be notification-worthy — the next
/// pass must diff against the most recent state, not a stale one. Delivery
/// happens after this returns and a failed delivery rolls nothing back.
pub async fn run_pass<A: ForgeApi>(
    api: &A,
    store: &SnapshotStore,
    addresses: &[String],
) -> BatchOutcome {
    // Fan out one user fetch per address.
    let fetched = join_all(addresses.iter().map(|address| async move {
        (address.as_str(), api.user_record(address).await)
    }))
    .await;

    let mut users: Vec<(String, UserRecord)> = Vec::new();
    for (address, result) in fetched {
        match result {
            Ok(user) => users.push((address.to_string(), user)),
            Err(e) => warn!("Skipping {address}: failed to fetch user record: {e:#}"),
        }
    }

    // One weight ranking per distinct topic, shared by every address in the
    // batch that competes there.
    let topics: BTreeSet<i64> = users
        .iter()
        .flat_map(|(_, user)| user.competitions.iter().map(|c| c.topic_id))
        .collect();
    info!(
        "Processing {} of {} address(es) across {} topic(s)",
        users.len(),
        addresses.len(),
        topics.len()
    );

    let weight_sets = join_all(topics.iter().map(|&topic_id| async move {
        (topic_id, api.competition_weights(topic_id).await)
    }))
    .await;

    let mut boards: HashMap<i64, WeightBoard> = HashMap::new();
    for (topic_id, result) in weight_sets {
        match result {
            Ok(raw) => {
                boards.insert(topic_id, WeightBoard::from_raw(&raw));
            }
            Err(e) => warn!("Weights unavailable for topic {topic_id}: {e:#}"),
        }
    }

    let mut reports = Vec::new();
    for (address, user) in users {
        let snapshot = build_snapshot(&address, &user, &boards);
        let previous = match store.load(&address) {
            Ok(previous) => previous,
            Err(e) => {
                // A readable-but-broken history must not be overwritten by a
                // diff against nothing; leave it for inspection.
                warn!("Skipping {address}: failed to load previous snapshot: {e:#}");
                continue;
            }
        };
        let change = detector::detect(&snapshot, previous.as_ref());

        let name = format!("{} {}", user.first_name, user.last_name)
            .trim()
            .to_string();
        reports.push(UserReport {
            address,
            name,
            username: user.username,
            badge_name: user.badge_name,
            snapshot,
            change,
        });
    }
    reports.sort_by_key(|r| r.snapshot.rank);

    let outcome = BatchOutcome { reports };
    for report in &outcome.reports {
        if let Err(e) = store.save(&report.address, &report.snapshot) {
            warn!("Failed to persist snapshot for {}: {e:#}", report.address);
        }
    }
    outcome
}

/// Build the point-in-time snapshot for one address, enriching each
/// competition with the address's standing on its topic's weight board.
fn build_snapshot(
    address: &str,
    user: &UserRecord,
    boards: &HashMap<i64, WeightBoard>,
) -> UserSnapshot {
    let mut competitions: Vec<CompetitionStanding> = user
        .competitions
        .iter()
        .map(|comp| {
            let mut standing = CompetitionStanding {
                id: comp.id,
                name: comp.name.clone(),
                topic_id: comp.topic_id,
                rank: comp.ranking,
                points: comp.points,
                weight: 0.0,
                weight_rank: None,
                total_weight_participants: 0,
            };
            if let Some(board) = boards.get(&comp.topic_id) {
                if let Some(entry) = board.standing(address) {
                    standing.weight = entry.weight;
                    standing.weight_rank = Some(entry.rank);
                    standing.total_weight_participants = board.len() as u32;
                }
            }
            standing
        })
        .collect();
    competitions.sort_by_key(|c| c.id);

    UserSnapshot {
        timestamp: Utc::now(),
        rank: user.ranking,
        points: user.total_points,
        competitions,
    }
}
