//! Data quality assessment.
//!
//! Three views over the same counts:
//!
//! - [`QualityScorer`] turns them into a 100-point [`QualityScore`] made of
//!   four 25-point sub-scores (completeness, uniqueness, consistency,
//!   validity).
//! - [`SuggestionEngine`] turns them into an ordered list of
//!   [`Suggestion`]s, one per actionable issue.
//! - [`diagnose`] reports per-column missing percentages, dtypes and a
//!   good / warning / critical health label.
//!
//! # Example
//!
//! ```
//! use tidyset::{quality::{QualityScorer, SuggestionEngine}, Column, Snapshot};
//!
//! let snapshot = Snapshot::from_columns([
//!     ("age", Column::numeric([Some(25.0), Some(30.0), None, Some(1000.0)])),
//! ])
//! .unwrap();
//!
//! let score = QualityScorer::new().score(&snapshot);
//! assert!(score.total <= 100.0);
//!
//! let suggestions = SuggestionEngine::new().suggest(&snapshot);
//! assert_eq!(suggestions[0].column, "age");
//! ```

#![allow(clippy::cast_precision_loss)]

mod diagnosis;
mod scoring;
mod suggestions;


pub use diagnosis::{diagnose, diagnose_with, ColumnHealth, DiagnosisReport};
pub use scoring::{score, QualityCounts, QualityScore, QualityScorer, SUB_SCORE_MAX};
use serde::{Deserialize, Serialize};
pub use suggestions::{
    suggest, IssueKind, Suggestion, SuggestionEngine, SuggestionSeverity, ALL_COLUMNS,
};

use crate::{
    error::{Error, Result},
    stats::IqrRule,
};

/// Tunable limits shared by scoring, suggestions and diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Missing percentage above which a missing-value suggestion is `high`
    /// severity and a column is `critical` (default: 20.0).
    pub high_missing_percent: f64,
    /// IQR multiplier for outlier fences (default: 1.5).
    pub iqr_multiplier: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_missing_percent: 20.0,
            iqr_multiplier: 1.5,
        }
    }
}

impl Thresholds {
    /// The outlier rule for these thresholds.
    pub fn rule(&self) -> IqrRule {
        IqrRule::new(self.iqr_multiplier)
    }

    /// Checks that both limits are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when a limit is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.high_missing_percent) {
            return Err(Error::invalid_config(format!(
                "high_missing_percent must be within 0..=100, got {}",
                self.high_missing_percent
            )));
        }
        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(Error::invalid_config(format!(
                "iqr_multiplier must be a non-negative number, got {}",
                self.iqr_multiplier
            )));
        }
        Ok(())
    }
}

/// Rounds to `places` decimal places the way Python's `round` does: on the
/// exact binary value, with exact ties going to the even digit.
pub(crate) fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}
