use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::types::UserSnapshot;

/// File-per-address snapshot persistence.
///
/// Each address owns one JSON file under the base directory; a save replaces
/// the whole snapshot, never merges. The store keeps no index of known
/// addresses — the caller supplies the working set every pass.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    base_dir: PathBuf,
}

impl SnapshotStore {
    /// Open the store, creating the base directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("failed to create {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn path(&self, address: &str) -> PathBuf {
        self.base_dir.join(format!("history_{address}.json"))
    }

    /// Load the previous snapshot for an address.
    ///
    /// `Ok(None)` means no snapshot exists yet (first pass for this address).
    /// Any other read or decode problem is an error, so a corrupt file is
    /// never silently treated as fresh history.
    pub fn load(&self, address: &str) -> Result<Option<UserSnapshot>> {
        let path = self.path(address);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let snapshot = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        Ok(Some(snapshot))
    }

    /// Overwrite the snapshot for an address.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the target, so a crash mid-save never leaves a partial snapshot
    /// visible to the next process start.
    pub fn save(&self, address: &str, snapshot: &UserSnapshot) -> Result<()> {
        let path = self.path(address);
        let tmp = path.with_extension("json.tmp");

        let bytes =
            serde_json::to_vec_pretty(snapshot).context("failed to serialize snapshot")?;
        fs::write(&tmp, bytes).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompetitionStanding;
    use chrono::{TimeZone, Utc};

    fn sample_snapshot() -> UserSnapshot {
        UserSnapshot {
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            rank: 5,
            points: 10.0,
            competitions: vec![CompetitionStanding {
                id: 1,
                name: "ETH 5min".to_string(),
                topic_id: 13,
                rank: 3,
                points: 2.0,
                weight: 0.01,
                weight_rank: Some(4),
                total_weight_participants: 10,
            }],
        }
    }

    #[test]
    fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        assert!(store.load("allo1abc").unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        let snapshot = sample_snapshot();

        store.save("allo1abc", &snapshot).unwrap();
        let loaded = store.load("allo1abc").unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();

        let mut snapshot = sample_snapshot();
        store.save("allo1abc", &snapshot).unwrap();

        snapshot.rank = 3;
        snapshot.competitions.clear();
        store.save("allo1abc", &snapshot).unwrap();

        let loaded = store.load("allo1abc").unwrap().unwrap();
        assert_eq!(loaded.rank, 3);
        assert!(loaded.competitions.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error_not_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        std::fs::write(dir.path().join("history_allo1abc.json"), b"{ not json").unwrap();

        assert!(store.load("allo1abc").is_err());
    }

    #[test]
    fn addresses_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        let a = sample_snapshot();
        let mut b = sample_snapshot();
        b.rank = 99;

        store.save("allo1aaa", &a).unwrap();
        store.save("allo1bbb", &b).unwrap();
        assert_eq!(store.load("allo1aaa").unwrap().unwrap().rank, 5);
        assert_eq!(store.load("allo1bbb").unwrap().unwrap().rank, 99);
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        store.save("allo1abc", &sample_snapshot()).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["history_allo1abc.json".to_string()]);
    }
}
