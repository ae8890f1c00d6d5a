//! Append-only version history per dataset.
//!
//! Every commit writes two copies of the snapshot: an immutable version under
//! `versions/<stem>_<YYYYMMDD_HHMMSS><ext>` and the mutable "latest" copy
//! under `latest/<filename>`. The record of each commit is appended to
//! `versions/index.json`. History is never pruned; [`VersionStore::revert`]
//! only moves the latest pointer.
//!
//! Commits for one filename are expected to come from a single writer.
//! Concurrent commits are not coordinated; the last write to the latest copy
//! wins.

mod index;
mod naming;

use std::sync::Arc;

use bytes::Bytes;
use chrono::NaiveDateTime;
pub use index::{DatasetHistory, VersionIndex, VersionRecord};
pub use naming::{
    split_filename, validate_filename, version_name, MAX_COUNTER, TIMESTAMP_FORMAT,
};

use crate::{
    backend::StorageBackend,
    error::{Error, Result},
    snapshot::{FileFormat, Snapshot},
};

const VERSION_PREFIX: &str = "versions/";
const LATEST_PREFIX: &str = "latest/";
const INDEX_KEY: &str = "versions/index.json";

/// Source of commit timestamps.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Serializes a snapshot the way files named like `filename` are stored:
/// Parquet for `.parquet`, CSV for everything else.
pub(crate) fn encode_snapshot(filename: &str, snapshot: &Snapshot) -> Result<Bytes> {
    let data = match FileFormat::from_path(filename) {
        Ok(FileFormat::Parquet) => snapshot.to_parquet_bytes()?,
        _ => snapshot.to_csv_bytes()?,
    };
    Ok(Bytes::from(data))
}

/// Inverse of [`encode_snapshot`].
pub(crate) fn decode_snapshot(filename: &str, data: &[u8]) -> Result<Snapshot> {
    match FileFormat::from_path(filename) {
        Ok(FileFormat::Parquet) => Snapshot::from_parquet_bytes(data),
        _ => Snapshot::from_csv_bytes(data),
    }
}

/// Version history stored in a [`StorageBackend`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use tidyset::{backend::MemoryBackend, versioning::VersionStore, Column, Snapshot};
///
/// let store = VersionStore::new(Arc::new(MemoryBackend::new()));
/// let snapshot = Snapshot::from_columns([("v", Column::numeric([Some(1.0)]))]).unwrap();
///
/// store.commit("data.csv", &snapshot, "first").unwrap();
/// store.commit("data.csv", &snapshot, "second").unwrap();
///
/// let versions = store.list_versions("data.csv").unwrap();
/// assert_eq!(versions[0].action, "second");
/// ```
pub struct VersionStore {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
}

impl VersionStore {
    /// Creates a store using the local wall clock.
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Loads the version index; an absent index is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the index exists but cannot be read or parsed.
    pub fn load_index(&self) -> Result<VersionIndex> {
        match self.backend.try_get(INDEX_KEY)? {
            Some(data) => serde_json::from_slice(&data)
                .map_err(|e| Error::storage(format!("failed to parse version index: {e}"))),
            None => Ok(VersionIndex::new()),
        }
    }

    fn save_index(&self, index: &VersionIndex) -> Result<()> {
        let data = serde_json::to_vec_pretty(index)?;
        self.backend.put(INDEX_KEY, data.into())
    }

    /// Commits `snapshot` as the newest version and the latest copy of
    /// `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid filenames or if storage fails.
    pub fn commit(&self, filename: &str, snapshot: &Snapshot, action: &str) -> Result<VersionRecord> {
        validate_filename(filename)?;
        let mut index = self.load_index()?;
        let created_at = self.clock.now();

        let name = naming::unique_version_name(filename, created_at, |candidate| {
            Ok(index.contains_name(candidate)
                || self.backend.exists(&format!("{VERSION_PREFIX}{candidate}"))?)
        })?;

        let data = encode_snapshot(filename, snapshot)?;
        self.backend
            .put(&format!("{VERSION_PREFIX}{name}"), data.clone())?;
        self.backend.put(&latest_key(filename), data)?;

        let history = index.history_mut(filename);
        let record = VersionRecord {
            filename: filename.to_string(),
            name,
            sequence: history.records.len() + 1,
            action: action.to_string(),
            created_at,
            rows: snapshot.num_rows(),
            columns: snapshot.num_columns(),
        };
        history.records.push(record.clone());
        self.save_index(&index)?;

        tracing::info!(
            filename,
            version = %record.name,
            sequence = record.sequence,
            action,
            "committed version"
        );
        Ok(record)
    }

    /// Records of `filename`, newest first. Empty if nothing was committed.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be loaded.
    pub fn list_versions(&self, filename: &str) -> Result<Vec<VersionRecord>> {
        Ok(self.load_index()?.records_desc(filename))
    }

    /// True if `filename` has at least one version.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be loaded.
    pub fn has_versions(&self, filename: &str) -> Result<bool> {
        Ok(self
            .load_index()?
            .history(filename)
            .is_some_and(|h| !h.records.is_empty()))
    }

    fn record_at(&self, filename: &str, index: usize) -> Result<VersionRecord> {
        let records = self.list_versions(filename)?;
        let count = records.len();
        records
            .into_iter()
            .nth(index)
            .ok_or_else(|| Error::VersionNotFound {
                filename: filename.to_string(),
                index,
                count,
            })
    }

    fn version_bytes(&self, record: &VersionRecord) -> Result<Bytes> {
        self.backend
            .get(&format!("{VERSION_PREFIX}{}", record.name))
    }

    /// The snapshot at position `index` of [`list_versions`](Self::list_versions).
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if `index` is out of range.
    pub fn load_version(&self, filename: &str, index: usize) -> Result<Snapshot> {
        let record = self.record_at(filename, index)?;
        decode_snapshot(filename, &self.version_bytes(&record)?)
    }

    /// Makes version `index` the latest copy without adding a history
    /// entry. Returns the record that is now latest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionNotFound`] if `index` is out of range.
    pub fn revert(&self, filename: &str, index: usize) -> Result<VersionRecord> {
        let record = self.record_at(filename, index)?;
        let data = self.version_bytes(&record)?;
        self.backend.put(&latest_key(filename), data)?;
        tracing::info!(filename, index, version = %record.name, "reverted latest");
        Ok(record)
    }

    /// The latest copy of `filename`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored copy cannot be read or parsed.
    pub fn try_latest(&self, filename: &str) -> Result<Option<Snapshot>> {
        validate_filename(filename)?;
        self.backend
            .try_get(&latest_key(filename))?
            .map(|data| decode_snapshot(filename, &data))
            .transpose()
    }

    /// The latest copy of `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetNotFound`] if nothing was committed.
    pub fn latest(&self, filename: &str) -> Result<Snapshot> {
        self.try_latest(filename)?
            .ok_or_else(|| Error::dataset_not_found(filename))
    }

    /// Forgets the latest copy of `filename`. History is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn clear_latest(&self, filename: &str) -> Result<()> {
        validate_filename(filename)?;
        self.backend.delete(&latest_key(filename))?;
        tracing::debug!(filename, "cleared latest");
        Ok(())
    }
}

fn latest_key(filename: &str) -> String {
    format!("{LATEST_PREFIX}{filename}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{backend::MemoryBackend, snapshot::Column};

    fn fixed() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(2024, 3, 9)
                .and_then(|d| d.and_hms_opt(7, 5, 1))
                .expect("valid timestamp"),
        ))
    }

    fn store() -> VersionStore {
        VersionStore::new(Arc::new(MemoryBackend::new())).with_clock(fixed())
    }

    fn snap(v: f64) -> Snapshot {
        Snapshot::from_columns([
            ("v", Column::numeric([Some(v), None])),
            ("t", Column::text([Some("x"), Some("y")])),
        ])
        .expect("snapshot")
    }

    #[test]
    fn test_commit_writes_version_and_latest() {
        let store = store();
        let record = store.commit("data.csv", &snap(1.0), "first").expect("commit");
        assert_eq!(record.name, "data_20240309_070501.csv");
        assert_eq!(record.sequence, 1);
        assert_eq!(record.rows, 2);
        assert_eq!(record.columns, 2);
        assert_eq!(store.latest("data.csv").expect("latest"), snap(1.0));
    }

    #[test]
    fn test_same_second_commits_get_counters() {
        let store = store();
        let names: Vec<String> = (0..3)
            .map(|i| {
                store
                    .commit("data.csv", &snap(f64::from(i)), "c")
                    .expect("commit")
                    .name
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "data_20240309_070501.csv",
                "data_20240309_070501_001.csv",
                "data_20240309_070501_002.csv",
            ]
        );
    }

    #[test]
    fn test_list_newest_first_and_load() {
        let store = store();
        for (i, action) in ["A", "B", "C"].into_iter().enumerate() {
            store
                .commit("data.csv", &snap(i as f64), action)
                .expect("commit");
        }
        let actions: Vec<_> = store
            .list_versions("data.csv")
            .expect("list")
            .into_iter()
            .map(|r| r.action)
            .collect();
        assert_eq!(actions, vec!["C", "B", "A"]);
        assert_eq!(store.load_version("data.csv", 0).expect("load"), snap(2.0));
        assert_eq!(store.load_version("data.csv", 2).expect("load"), snap(0.0));
    }

    #[test]
    fn test_load_out_of_range() {
        let store = store();
        store.commit("data.csv", &snap(1.0), "a").expect("commit");
        let err = store.load_version("data.csv", 1).expect_err("out of range");
        assert!(matches!(
            err,
            Error::VersionNotFound {
                index: 1,
                count: 1,
                ..
            }
        ));
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_revert_keeps_history() {
        let store = store();
        for i in 0..3 {
            store
                .commit("data.csv", &snap(f64::from(i)), "c")
                .expect("commit");
        }
        let record = store.revert("data.csv", 2).expect("revert");
        assert_eq!(record.sequence, 1);
        assert_eq!(store.latest("data.csv").expect("latest"), snap(0.0));
        assert_eq!(store.list_versions("data.csv").expect("list").len(), 3);
    }

    #[test]
    fn test_latest_missing() {
        let store = store();
        assert!(matches!(
            store.latest("nope.csv"),
            Err(Error::DatasetNotFound { .. })
        ));
        assert!(store.list_versions("nope.csv").expect("list").is_empty());
        assert!(!store.has_versions("nope.csv").expect("has"));
    }

    #[test]
    fn test_clear_latest_keeps_history() {
        let store = store();
        store.commit("data.csv", &snap(1.0), "a").expect("commit");
        store.clear_latest("data.csv").expect("clear");
        assert!(store.try_latest("data.csv").expect("latest").is_none());
        assert!(store.has_versions("data.csv").expect("has"));
    }

    #[test]
    fn test_histories_are_per_filename() {
        let store = store();
        store.commit("a.csv", &snap(1.0), "a").expect("commit");
        store.commit("b.csv", &snap(2.0), "b").expect("commit");
        assert_eq!(store.list_versions("a.csv").expect("list").len(), 1);
        assert_eq!(store.latest("b.csv").expect("latest"), snap(2.0));
    }

    #[test]
    fn test_parquet_filenames_store_parquet() {
        let store = store();
        let snapshot = Snapshot::from_columns([("t", Column::text([Some("007"), None]))])
            .expect("snapshot");
        store.commit("data.parquet", &snapshot, "a").expect("commit");
        // CSV would have turned "007" into a number
        assert_eq!(store.latest("data.parquet").expect("latest"), snapshot);
    }

    #[test]
    fn test_rejects_bad_filename() {
        let store = store();
        assert!(store.commit("../x.csv", &snap(1.0), "a").is_err());
    }
}
