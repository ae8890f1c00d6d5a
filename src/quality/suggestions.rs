//! Cleaning suggestions.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::Thresholds;
use crate::{
    error::{Error, Result},
    snapshot::{ColumnKind, Snapshot},
    stats::{duplicate_count, looks_numeric, present_values},
};

/// Column label used by dataset-wide suggestions.
pub const ALL_COLUMNS: &str = "ALL";

/// Kind of problem a suggestion addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Column has missing cells.
    MissingValues,
    /// Dataset has repeated rows.
    Duplicates,
    /// Text column holds numbers.
    Datatype,
    /// Numeric column has IQR outliers.
    Outliers,
}

impl IssueKind {
    /// Wire name of the issue.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingValues => "missing_values",
            Self::Duplicates => "duplicates",
            Self::Datatype => "datatype",
            Self::Outliers => "outliers",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "missing_values" | "missing" => Ok(Self::MissingValues),
            "duplicates" => Ok(Self::Duplicates),
            "datatype" => Ok(Self::Datatype),
            "outliers" => Ok(Self::Outliers),
            other => Err(Error::invalid_input(format!("unknown issue '{other}'"))),
        }
    }
}

/// Urgency of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSeverity {
    /// Should be fixed before the data is used.
    High,
    /// Worth fixing.
    Medium,
}

/// One actionable cleaning suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Affected column, or [`ALL_COLUMNS`].
    pub column: String,
    /// What is wrong.
    pub issue: IssueKind,
    /// How urgent it is.
    pub severity: SuggestionSeverity,
    /// Human readable description of the problem.
    pub message: String,
    /// Human readable description of the fix.
    pub recommendation: String,
}

/// Derives suggestions from a snapshot.
///
/// Output order is fixed: missing values, duplicates, datatype, outliers,
/// and column order within each category.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestionEngine {
    thresholds: Thresholds,
}

impl SuggestionEngine {
    /// Creates an engine with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses custom thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Computes the suggestions for `snapshot`.
    pub fn suggest(&self, snapshot: &Snapshot) -> Vec<Suggestion> {
        let mut out = Vec::new();
        self.missing_values(snapshot, &mut out);
        Self::duplicates(snapshot, &mut out);
        Self::datatypes(snapshot, &mut out);
        self.outliers(snapshot, &mut out);
        out
    }

    fn missing_values(&self, snapshot: &Snapshot, out: &mut Vec<Suggestion>) {
        let rows = snapshot.num_rows();
        if rows == 0 {
            return;
        }
        for idx in 0..snapshot.num_columns() {
            let missing = snapshot.missing_count(idx);
            if missing == 0 {
                continue;
            }
            let pct = missing as f64 / rows as f64 * 100.0;
            let severity = if pct > self.thresholds.high_missing_percent {
                SuggestionSeverity::High
            } else {
                SuggestionSeverity::Medium
            };
            let strategy = match snapshot.kind(idx) {
                ColumnKind::Numeric => "median",
                ColumnKind::Text => "mode",
            };
            let column = snapshot.column_name(idx);
            out.push(Suggestion {
                message: format!("Column '{column}' has {pct:.1}% missing values."),
                recommendation: format!("Fill missing values using {strategy}."),
                column,
                issue: IssueKind::MissingValues,
                severity,
            });
        }
    }

    fn duplicates(snapshot: &Snapshot, out: &mut Vec<Suggestion>) {
        let count = duplicate_count(snapshot);
        if count > 0 {
            out.push(Suggestion {
                column: ALL_COLUMNS.to_string(),
                issue: IssueKind::Duplicates,
                severity: SuggestionSeverity::High,
                message: format!("Dataset contains {count} duplicate rows."),
                recommendation: "Remove duplicate rows.".to_string(),
            });
        }
    }

    fn datatypes(snapshot: &Snapshot, out: &mut Vec<Suggestion>) {
        for idx in 0..snapshot.num_columns() {
            let Some(arr) = snapshot.text_array(idx) else {
                continue;
            };
            if looks_numeric(arr) {
                let column = snapshot.column_name(idx);
                out.push(Suggestion {
                    message: format!("Column '{column}' looks numeric but is stored as text."),
                    recommendation: "Convert column to numeric type.".to_string(),
                    column,
                    issue: IssueKind::Datatype,
                    severity: SuggestionSeverity::Medium,
                });
            }
        }
    }

    fn outliers(&self, snapshot: &Snapshot, out: &mut Vec<Suggestion>) {
        let rule = self.thresholds.rule();
        for idx in snapshot.numeric_indices() {
            let Some(arr) = snapshot.numeric_array(idx) else {
                continue;
            };
            let count = rule.count_outliers(&present_values(arr));
            if count > 0 {
                let column = snapshot.column_name(idx);
                out.push(Suggestion {
                    message: format!("Column '{column}' contains {count} outliers."),
                    recommendation: "Consider capping or removing outliers using IQR."
                        .to_string(),
                    column,
                    issue: IssueKind::Outliers,
                    severity: SuggestionSeverity::Medium,
                });
            }
        }
    }
}

/// Computes suggestions with default thresholds.
pub fn suggest(snapshot: &Snapshot) -> Vec<Suggestion> {
    SuggestionEngine::new().suggest(snapshot)
}
