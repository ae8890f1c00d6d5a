//! Column statistics.
//!
//! Per-column summaries (min, mean, max, sample variance), missing counts,
//! IQR outlier counts, duplicate-row detection and the pairwise correlation
//! matrix. Everything here is a pure function of a [`Snapshot`]; degenerate
//! input (no rows, all-missing columns) yields undefined statistics rather
//! than errors.

mod correlation;
mod numeric;

use std::collections::HashSet;

use arrow::array::{Array, Float64Array, StringArray};
pub use correlation::CorrelationMatrix;
pub use numeric::{
    looks_numeric, mean, median, numeric_mode, present_values, quantile, sample_variance, sorted,
    text_mode, Fences, IqrRule,
};
use serde::{Deserialize, Serialize};

use crate::snapshot::{ColumnKind, Snapshot};

/// Summary of a numeric column's non-missing values.
///
/// All fields except `outlier_count` are `None` when the column has no
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Smallest value.
    pub min: Option<f64>,
    /// Arithmetic mean.
    pub mean: Option<f64>,
    /// Largest value.
    pub max: Option<f64>,
    /// Sample variance.
    pub variance: Option<f64>,
    /// Values outside the IQR fences.
    pub outlier_count: usize,
}

impl NumericSummary {
    /// Summarizes the given values.
    pub fn from_values(values: &[f64], rule: &IqrRule) -> Self {
        Self {
            min: values.iter().copied().reduce(f64::min),
            mean: mean(values),
            max: values.iter().copied().reduce(f64::max),
            variance: sample_variance(values),
            outlier_count: rule.count_outliers(values),
        }
    }
}

/// Statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name.
    pub name: String,
    /// Storage type.
    pub kind: ColumnKind,
    /// Number of missing cells.
    pub missing_count: usize,
    /// Present for numeric columns only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
}

impl ColumnProfile {
    /// Outliers in this column (0 for text columns).
    pub fn outlier_count(&self) -> usize {
        self.numeric.map_or(0, |n| n.outlier_count)
    }
}

/// Statistics for a whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analytics {
    /// Number of rows.
    pub row_count: usize,
    /// Per-column profiles, in column order.
    pub columns: Vec<ColumnProfile>,
    /// Rows equal to an earlier row.
    pub duplicate_rows: usize,
    /// Correlation between numeric columns.
    pub correlation: CorrelationMatrix,
}

impl Analytics {
    /// Looks up a column profile by name.
    pub fn profile(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the numeric columns.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Missing cells across all columns.
    pub fn total_missing(&self) -> usize {
        self.columns.iter().map(|c| c.missing_count).sum()
    }

    /// Outliers across all numeric columns.
    pub fn total_outliers(&self) -> usize {
        self.columns.iter().map(ColumnProfile::outlier_count).sum()
    }
}

/// Computes column statistics under a given IQR rule.
///
/// # Example
///
/// ```
/// use tidyset::{stats::ColumnStatistics, Column, Snapshot};
///
/// let snapshot = Snapshot::from_columns([(
///     "v",
///     Column::numeric([Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(100.0)]),
/// )])
/// .unwrap();
/// let analytics = ColumnStatistics::new().analyze(&snapshot);
/// assert_eq!(analytics.total_outliers(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnStatistics {
    rule: IqrRule,
}

impl ColumnStatistics {
    /// Creates an analyzer with the default 1.5 x IQR rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom IQR rule.
    #[must_use]
    pub fn with_rule(mut self, rule: IqrRule) -> Self {
        self.rule = rule;
        self
    }

    /// The IQR rule in use.
    pub fn rule(&self) -> &IqrRule {
        &self.rule
    }

    /// Profiles the column at `idx`.
    pub fn profile_column(&self, snapshot: &Snapshot, idx: usize) -> ColumnProfile {
        let kind = snapshot.kind(idx);
        let numeric = snapshot
            .numeric_array(idx)
            .map(|arr| NumericSummary::from_values(&present_values(arr), &self.rule));
        ColumnProfile {
            name: snapshot.column_name(idx),
            kind,
            missing_count: snapshot.missing_count(idx),
            numeric,
        }
    }

    /// Profiles every column and computes duplicates and correlation.
    pub fn analyze(&self, snapshot: &Snapshot) -> Analytics {
        Analytics {
            row_count: snapshot.num_rows(),
            columns: (0..snapshot.num_columns())
                .map(|idx| self.profile_column(snapshot, idx))
                .collect(),
            duplicate_rows: duplicate_count(snapshot),
            correlation: CorrelationMatrix::compute(snapshot),
        }
    }

    /// Outlier cells summed over numeric columns.
    pub fn outlier_cells(&self, snapshot: &Snapshot) -> usize {
        snapshot
            .numeric_indices()
            .into_iter()
            .filter_map(|idx| snapshot.numeric_array(idx))
            .map(|arr| self.rule.count_outliers(&present_values(arr)))
            .sum()
    }
}

/// Per-row flag: true if the row's full value tuple equals an earlier row's.
/// Missing equals missing.
pub fn duplicate_mask(snapshot: &Snapshot) -> Vec<bool> {
    let batch = snapshot.batch();
    let mut seen = HashSet::with_capacity(batch.num_rows());
    (0..batch.num_rows())
        .map(|row| !seen.insert(row_key(snapshot, row)))
        .collect()
}

/// Number of duplicate rows.
pub fn duplicate_count(snapshot: &Snapshot) -> usize {
    duplicate_mask(snapshot).into_iter().filter(|d| *d).count()
}

/// One cell of a row key. Text borrows from the batch, so keys of rows
/// that differ in any cell never collide.
#[derive(Debug, PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Missing,
    Num(u64),
    Text(&'a str),
    Other(String),
}

fn row_key(snapshot: &Snapshot, row: usize) -> Vec<CellKey<'_>> {
    snapshot
        .batch()
        .columns()
        .iter()
        .map(|col| {
            if col.is_null(row) {
                CellKey::Missing
            } else if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
                // 0.0 and -0.0 compare equal
                let v = arr.value(row);
                let v = if v == 0.0 { 0.0_f64 } else { v };
                CellKey::Num(v.to_bits())
            } else if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
                CellKey::Text(arr.value(row))
            } else {
                CellKey::Other(format!("{:?}", col.data_type()))
            }
        })
        .collect()
}
