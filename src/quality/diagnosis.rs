//! Per-column health report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{round_to, Thresholds};
use crate::{snapshot::Snapshot, stats::duplicate_count};

/// Health label of a column, by missing percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnHealth {
    /// No missing cells.
    Good,
    /// Some missing cells, below the high threshold.
    Warning,
    /// Missing share at or above the high threshold.
    Critical,
}

impl ColumnHealth {
    /// Lowercase label, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    fn from_percent(pct: f64, high: f64) -> Self {
        if pct == 0.0 {
            Self::Good
        } else if pct < high {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

/// Shape, missing share, dtype and health of every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisReport {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub columns: usize,
    /// Missing percentage per column, two decimals.
    pub missing_percent: BTreeMap<String, f64>,
    /// Duplicate rows.
    pub duplicates: usize,
    /// `float64` or `object` per column.
    pub dtypes: BTreeMap<String, String>,
    /// Health per column.
    pub severity: BTreeMap<String, ColumnHealth>,
}

/// Diagnoses `snapshot` with default thresholds.
pub fn diagnose(snapshot: &Snapshot) -> DiagnosisReport {
    diagnose_with(snapshot, &Thresholds::default())
}

/// Diagnoses `snapshot`.
pub fn diagnose_with(snapshot: &Snapshot, thresholds: &Thresholds) -> DiagnosisReport {
    let rows = snapshot.num_rows();
    let mut missing_percent = BTreeMap::new();
    let mut dtypes = BTreeMap::new();
    let mut severity = BTreeMap::new();

    for idx in 0..snapshot.num_columns() {
        let name = snapshot.column_name(idx);
        let pct = if rows == 0 {
            0.0
        } else {
            round_to(snapshot.missing_count(idx) as f64 / rows as f64 * 100.0, 2)
        };
        severity.insert(
            name.clone(),
            ColumnHealth::from_percent(pct, thresholds.high_missing_percent),
        );
        dtypes.insert(name.clone(), snapshot.kind(idx).dtype_name().to_string());
        missing_percent.insert(name, pct);
    }

    DiagnosisReport {
        rows,
        columns: snapshot.num_columns(),
        missing_percent,
        duplicates: duplicate_count(snapshot),
        dtypes,
        severity,
    }
}
