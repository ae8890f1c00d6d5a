//! 100-point quality score.

use serde::{Deserialize, Serialize};

use super::round_to;
use crate::{
    snapshot::Snapshot,
    stats::{duplicate_count, looks_numeric, ColumnStatistics, IqrRule},
};

/// Upper bound of each sub-score.
pub const SUB_SCORE_MAX: f64 = 25.0;

/// Quality score: four sub-scores in `[0, 25]` and their total in
/// `[0, 100]`, each rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityScore {
    /// Sum of the sub-scores.
    pub total: f64,
    /// Share of cells that are present.
    pub completeness: f64,
    /// Share of rows that are not duplicates.
    pub uniqueness: f64,
    /// Share of columns whose storage type matches their content.
    pub consistency: f64,
    /// Share of cells that are not IQR outliers.
    pub validity: f64,
}

impl QualityScore {
    /// Builds a score from unrounded sub-scores.
    fn from_parts(completeness: f64, uniqueness: f64, consistency: f64, validity: f64) -> Self {
        let completeness = round_to(completeness, 1);
        let uniqueness = round_to(uniqueness, 1);
        let consistency = round_to(consistency, 1);
        let validity = round_to(validity, 1);
        Self {
            total: round_to(completeness + uniqueness + consistency + validity, 1),
            completeness,
            uniqueness,
            consistency,
            validity,
        }
    }
}

/// Raw counts every quality view is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QualityCounts {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub columns: usize,
    /// Rows times columns.
    pub cells: usize,
    /// Missing cells.
    pub missing_cells: usize,
    /// Rows equal to an earlier row.
    pub duplicate_rows: usize,
    /// Text columns whose values all parse as numbers.
    pub inconsistent_columns: usize,
    /// IQR outliers summed over numeric columns.
    pub outlier_cells: usize,
}

impl QualityCounts {
    /// Counts everything for `snapshot` under `rule`.
    pub fn collect(snapshot: &Snapshot, rule: &IqrRule) -> Self {
        let inconsistent_columns = (0..snapshot.num_columns())
            .filter_map(|idx| snapshot.text_array(idx))
            .filter(|arr| looks_numeric(arr))
            .count();

        Self {
            rows: snapshot.num_rows(),
            columns: snapshot.num_columns(),
            cells: snapshot.num_cells(),
            missing_cells: snapshot.total_missing(),
            duplicate_rows: duplicate_count(snapshot),
            inconsistent_columns,
            outlier_cells: ColumnStatistics::new()
                .with_rule(*rule)
                .outlier_cells(snapshot),
        }
    }

    /// The score these counts imply.
    pub fn score(&self) -> QualityScore {
        if self.rows == 0 || self.cells == 0 {
            return QualityScore::default();
        }
        QualityScore::from_parts(
            sub_score(self.missing_cells, self.cells),
            sub_score(self.duplicate_rows, self.rows),
            sub_score(self.inconsistent_columns, self.columns),
            sub_score(self.outlier_cells, self.cells),
        )
    }
}

fn sub_score(bad: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (SUB_SCORE_MAX * (1.0 - bad as f64 / total as f64)).clamp(0.0, SUB_SCORE_MAX)
}

/// Scores snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityScorer {
    rule: IqrRule,
}

impl QualityScorer {
    /// Creates a scorer with the default 1.5 x IQR outlier rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a custom outlier rule for the validity sub-score.
    #[must_use]
    pub fn with_rule(mut self, rule: IqrRule) -> Self {
        self.rule = rule;
        self
    }

    /// Raw counts for `snapshot`.
    pub fn counts(&self, snapshot: &Snapshot) -> QualityCounts {
        QualityCounts::collect(snapshot, &self.rule)
    }

    /// Scores `snapshot`.
    pub fn score(&self, snapshot: &Snapshot) -> QualityScore {
        self.counts(snapshot).score()
    }
}

/// Scores `snapshot` with default settings.
pub fn score(snapshot: &Snapshot) -> QualityScore {
    QualityScorer::new().score(snapshot)
}
