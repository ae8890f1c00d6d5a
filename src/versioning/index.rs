//! Version index format.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One committed snapshot.
///
/// Records are never changed after they are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Dataset filename the version belongs to.
    pub filename: String,
    /// Storage name of the version, `<stem>_<YYYYMMDD_HHMMSS><ext>`.
    pub name: String,
    /// 1-based commit number within the dataset's history.
    pub sequence: usize,
    /// What produced the version, e.g. `Applied missing_values fix on age`.
    pub action: String,
    /// Local time of the commit.
    pub created_at: NaiveDateTime,
    /// Rows in the committed snapshot.
    pub rows: usize,
    /// Columns in the committed snapshot.
    pub columns: usize,
}

/// Commit history of one dataset, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetHistory {
    /// Dataset filename.
    pub filename: String,
    /// Records in commit order.
    pub records: Vec<VersionRecord>,
}

/// Index of every dataset's history, stored as JSON.
///
/// ```json
/// {
///   "version": "1.0",
///   "datasets": [
///     {
///       "filename": "sales.csv",
///       "records": [
///         {
///           "filename": "sales.csv",
///           "name": "sales_20240309_070501.csv",
///           "sequence": 1,
///           "action": "Custom cleaning applied",
///           "created_at": "2024-03-09T07:05:01",
///           "rows": 120,
///           "columns": 6
///         }
///       ]
///     }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIndex {
    /// Index format version.
    pub version: String,
    /// Histories, one per filename.
    pub datasets: Vec<DatasetHistory>,
}

impl VersionIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            datasets: Vec::new(),
        }
    }

    /// The history of `filename`, if anything was committed.
    pub fn history(&self, filename: &str) -> Option<&DatasetHistory> {
        self.datasets.iter().find(|d| d.filename == filename)
    }

    /// The history of `filename`, created empty if missing.
    pub fn history_mut(&mut self, filename: &str) -> &mut DatasetHistory {
        let pos = match self.datasets.iter().position(|d| d.filename == filename) {
            Some(pos) => pos,
            None => {
                self.datasets.push(DatasetHistory {
                    filename: filename.to_string(),
                    records: Vec::new(),
                });
                self.datasets.len() - 1
            }
        };
        &mut self.datasets[pos]
    }

    /// Records of `filename`, newest name first.
    pub fn records_desc(&self, filename: &str) -> Vec<VersionRecord> {
        let mut records = self
            .history(filename)
            .map(|h| h.records.clone())
            .unwrap_or_default();
        records.sort_by(|a, b| b.name.cmp(&a.name));
        records
    }

    /// True if any record uses the storage name `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.datasets
            .iter()
            .flat_map(|d| d.records.iter())
            .any(|r| r.name == name)
    }
}

impl Default for VersionIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(name: &str, sequence: usize) -> VersionRecord {
        VersionRecord {
            filename: "sales.csv".to_string(),
            name: name.to_string(),
            sequence,
            action: "Custom cleaning applied".to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 9)
                .and_then(|d| d.and_hms_opt(7, 5, 1))
                .expect("valid timestamp"),
            rows: 3,
            columns: 2,
        }
    }

    #[test]
    fn test_history_mut_creates_once() {
        let mut index = VersionIndex::new();
        index.history_mut("sales.csv").records.push(record("a", 1));
        index.history_mut("sales.csv").records.push(record("b", 2));
        assert_eq!(index.datasets.len(), 1);
        assert_eq!(index.history("sales.csv").map(|h| h.records.len()), Some(2));
        assert!(index.history("other.csv").is_none());
    }

    #[test]
    fn test_records_desc() {
        let mut index = VersionIndex::new();
        let history = index.history_mut("sales.csv");
        history
            .records
            .push(record("sales_20240309_070501.csv", 1));
        history
            .records
            .push(record("sales_20240309_070501_001.csv", 2));
        history
            .records
            .push(record("sales_20240310_000000.csv", 3));

        let names: Vec<_> = index
            .records_desc("sales.csv")
            .into_iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(names, vec![3, 2, 1]);
        assert!(index.contains_name("sales_20240309_070501_001.csv"));
    }

    #[test]
    fn test_json_shape() {
        let mut index = VersionIndex::new();
        index
            .history_mut("sales.csv")
            .records
            .push(record("sales_20240309_070501.csv", 1));
        let json = serde_json::to_value(&index).expect("json");
        assert_eq!(json["version"], "1.0");
        assert_eq!(
            json["datasets"][0]["records"][0]["created_at"],
            "2024-03-09T07:05:01"
        );
        let back: VersionIndex = serde_json::from_value(json).expect("parse");
        assert_eq!(back, index);
    }
}
