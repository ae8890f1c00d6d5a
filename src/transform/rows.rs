//! Row-dropping transforms.

use arrow::array::BooleanArray;

use super::{numeric_column, Transform};
use crate::{
    error::Result,
    snapshot::Snapshot,
    stats::{duplicate_mask, present_values, IqrRule},
};

/// Drops rows equal to an earlier row, keeping the first occurrence and
/// the original order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDuplicates;

impl Transform for RemoveDuplicates {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let mask = duplicate_mask(snapshot);
        let dropped = mask.iter().filter(|d| **d).count();
        if dropped == 0 {
            return Ok(snapshot.clone());
        }
        tracing::debug!(dropped, "removing duplicate rows");
        let keep: BooleanArray = mask.into_iter().map(|dup| Some(!dup)).collect();
        snapshot.filter_rows(&keep)
    }

    fn describe(&self) -> String {
        "Removed duplicate rows".to_string()
    }
}

/// Drops rows whose value in a numeric column lies outside the IQR fences.
///
/// Rows with a missing value in that column are kept. The fences are
/// computed once, so removing rows can leave new outliers behind.
#[derive(Debug, Clone)]
pub struct RemoveOutliers {
    column: String,
    rule: IqrRule,
}

impl RemoveOutliers {
    /// Creates the transform with the default 1.5 x IQR rule.
    pub fn new<S: Into<String>>(column: S) -> Self {
        Self {
            column: column.into(),
            rule: IqrRule::default(),
        }
    }

    /// Uses a custom outlier rule.
    #[must_use]
    pub fn with_rule(mut self, rule: IqrRule) -> Self {
        self.rule = rule;
        self
    }

    /// Returns the column name.
    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Transform for RemoveOutliers {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let (_, arr) = numeric_column(snapshot, &self.column)?;
        let Some(fences) = self.rule.fences(&present_values(arr)) else {
            return Ok(snapshot.clone());
        };

        let keep: BooleanArray = arr
            .iter()
            .map(|v| Some(v.map_or(true, |x| !fences.is_outlier(x))))
            .collect();
        let dropped = keep.false_count();
        if dropped == 0 {
            return Ok(snapshot.clone());
        }
        tracing::debug!(
            column = %self.column,
            lower = fences.lower,
            upper = fences.upper,
            dropped,
            "removing outlier rows"
        );
        snapshot.filter_rows(&keep)
    }

    fn describe(&self) -> String {
        format!("Removed outlier rows in {}", self.column)
    }
}
