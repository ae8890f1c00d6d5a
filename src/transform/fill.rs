//! Missing-value imputation.

use std::{fmt, str::FromStr};

use arrow::array::Array;
use serde::{Deserialize, Serialize};

use super::{numeric_column, Transform};
use crate::{
    error::{Error, Result},
    snapshot::{Column, ColumnKind, Snapshot},
    stats::{mean, median, numeric_mode, present_values, text_mode},
};

/// Statistic used to fill missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    /// Median for numeric columns, mode for text columns.
    #[default]
    Auto,
    /// Arithmetic mean (numeric only).
    Mean,
    /// Median (numeric only).
    Median,
    /// Most frequent value; ties go to the smallest.
    Mode,
}

impl FillStrategy {
    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
        }
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            other => Err(Error::invalid_input(format!(
                "unknown fill strategy '{other}' (expected auto, mean, median or mode)"
            ))),
        }
    }
}

/// Replaces missing cells of one column with a statistic of its present
/// values.
///
/// An entirely missing column has no statistic and is returned unchanged.
/// Applying the transform twice gives the same result as applying it once.
#[derive(Debug, Clone)]
pub struct FillMissing {
    column: String,
    strategy: FillStrategy,
}

impl FillMissing {
    /// Creates a fill transform for `column`.
    pub fn new<S: Into<String>>(column: S, strategy: FillStrategy) -> Self {
        Self {
            column: column.into(),
            strategy,
        }
    }

    /// Fill with median or mode, depending on the column type.
    pub fn auto<S: Into<String>>(column: S) -> Self {
        Self::new(column, FillStrategy::Auto)
    }

    /// Returns the column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the fill strategy.
    pub fn strategy(&self) -> FillStrategy {
        self.strategy
    }

    fn fill_numeric(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let (idx, arr) = numeric_column(snapshot, &self.column)?;
        if arr.null_count() == 0 {
            return Ok(snapshot.clone());
        }
        let values = present_values(arr);
        let fill = match self.strategy {
            FillStrategy::Auto | FillStrategy::Median => median(&values),
            FillStrategy::Mean => mean(&values),
            FillStrategy::Mode => numeric_mode(&values),
        };
        let Some(fill) = fill else {
            return Ok(snapshot.clone());
        };

        tracing::debug!(
            column = %self.column,
            strategy = %self.strategy,
            value = fill,
            filled = arr.null_count(),
            "filling missing values"
        );
        let filled = Column::numeric(arr.iter().map(|v| v.or(Some(fill))));
        snapshot.replace_column(idx, filled)
    }

    fn fill_text(&self, snapshot: &Snapshot, idx: usize) -> Result<Snapshot> {
        if matches!(self.strategy, FillStrategy::Mean | FillStrategy::Median) {
            return Err(Error::not_numeric(&self.column));
        }
        let Some(arr) = snapshot.text_array(idx) else {
            return Err(Error::schema_mismatch(format!(
                "column '{}' is not a text column",
                self.column
            )));
        };
        if arr.null_count() == 0 {
            return Ok(snapshot.clone());
        }
        let Some(fill) = text_mode(arr) else {
            return Ok(snapshot.clone());
        };

        tracing::debug!(
            column = %self.column,
            value = %fill,
            filled = arr.null_count(),
            "filling missing values with mode"
        );
        let filled = Column::text(arr.iter().map(|v| Some(v.unwrap_or(fill.as_str()))));
        snapshot.replace_column(idx, filled)
    }
}

impl Transform for FillMissing {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let idx = snapshot.column_index(&self.column)?;
        match snapshot.kind(idx) {
            ColumnKind::Numeric => self.fill_numeric(snapshot),
            ColumnKind::Text => self.fill_text(snapshot, idx),
        }
    }

    fn describe(&self) -> String {
        format!("Filled missing values in {} ({})", self.column, self.strategy)
    }
}
