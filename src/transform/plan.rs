//! Composite cleaning operations: single suggestion fixes, apply-all and
//! user-configured cleaning plans.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{
    CapOutliers, Chain, ConvertNumeric, FillMissing, FillStrategy, RemoveDuplicates,
    RemoveOutliers, Transform,
};
use crate::{
    error::{Error, Result},
    quality::{IssueKind, Suggestion, SuggestionEngine, Thresholds},
    snapshot::Snapshot,
    stats::IqrRule,
};

/// The transform that fixes `issue` on `column`.
///
/// | issue            | transform                     |
/// |------------------|-------------------------------|
/// | `missing_values` | [`FillMissing`] (auto)        |
/// | `duplicates`     | [`RemoveDuplicates`]          |
/// | `datatype`       | [`ConvertNumeric`]            |
/// | `outliers`       | [`CapOutliers`]               |
///
/// `column` is ignored for duplicates.
pub fn remedy(issue: IssueKind, column: &str, rule: IqrRule) -> Box<dyn Transform> {
    match issue {
        IssueKind::MissingValues => Box::new(FillMissing::auto(column)),
        IssueKind::Duplicates => Box::new(RemoveDuplicates),
        IssueKind::Datatype => Box::new(ConvertNumeric::new(column)),
        IssueKind::Outliers => Box::new(CapOutliers::new(column).with_rule(rule)),
    }
}

/// Fixes a single issue on a single column.
#[derive(Debug, Clone)]
pub struct ApplySuggestion {
    issue: IssueKind,
    column: String,
    rule: IqrRule,
}

impl ApplySuggestion {
    /// Creates the fix for `issue` on `column`.
    pub fn new<S: Into<String>>(issue: IssueKind, column: S) -> Self {
        Self {
            issue,
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

    /// The issue being fixed.
    pub fn issue(&self) -> IssueKind {
        self.issue
    }
}

impl From<&Suggestion> for ApplySuggestion {
    fn from(suggestion: &Suggestion) -> Self {
        Self::new(suggestion.issue, suggestion.column.clone())
    }
}

impl Transform for ApplySuggestion {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        remedy(self.issue, &self.column, self.rule).apply(snapshot)
    }

    fn describe(&self) -> String {
        format!("Applied {} fix on {}", self.issue, self.column)
    }
}

/// Computes the suggestions once and applies the fix for each of them, in
/// suggestion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyAll {
    thresholds: Thresholds,
}

impl ApplyAll {
    /// Creates the transform with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses custom thresholds for both the suggestions and the fixes.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Applies every suggested fix and returns the result together with the
    /// suggestions that were acted on.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the fixes fails.
    pub fn run(&self, snapshot: &Snapshot) -> Result<(Snapshot, Vec<Suggestion>)> {
        let suggestions = SuggestionEngine::new()
            .with_thresholds(self.thresholds)
            .suggest(snapshot);

        let chain = suggestions.iter().fold(Chain::new(), |chain, s| {
            chain.then_boxed(remedy(s.issue, &s.column, self.thresholds.rule()))
        });
        tracing::info!(fixes = chain.len(), "applying all suggestions");

        Ok((chain.apply(snapshot)?, suggestions))
    }
}

impl Transform for ApplyAll {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        self.run(snapshot).map(|(cleaned, _)| cleaned)
    }

    fn describe(&self) -> String {
        "Applied all cleaning suggestions".to_string()
    }
}

/// What a [`CleaningPlan`] does with outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierAction {
    /// Clip values into the fences.
    Cap,
    /// Drop rows with an outlying value.
    Remove,
}

impl fmt::Display for OutlierAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cap => "cap",
            Self::Remove => "remove",
        })
    }
}

impl FromStr for OutlierAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cap" => Ok(Self::Cap),
            "remove" => Ok(Self::Remove),
            other => Err(Error::invalid_input(format!(
                "unknown outlier action '{other}' (expected cap or remove)"
            ))),
        }
    }
}

/// A user-configured cleaning pass.
///
/// Steps run in a fixed order: fill missing values in every numeric column,
/// handle outliers in every numeric column, then drop duplicate rows. Every
/// step is optional; an empty plan is the identity.
///
/// # Example
///
/// ```
/// use tidyset::{
///     transform::{CleaningPlan, FillStrategy, OutlierAction, Transform},
///     Column, Snapshot,
/// };
///
/// let snapshot = Snapshot::from_columns([
///     ("v", Column::numeric([Some(1.0), None, Some(3.0)])),
/// ])
/// .unwrap();
///
/// let plan = CleaningPlan::new()
///     .fill_missing(FillStrategy::Mean)
///     .outliers(OutlierAction::Cap)
///     .remove_duplicates(true);
/// let cleaned = plan.apply(&snapshot).unwrap();
/// assert_eq!(cleaned.total_missing(), 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningPlan {
    /// Fill strategy for numeric columns.
    pub missing: Option<FillStrategy>,
    /// Outlier handling for numeric columns.
    pub outliers: Option<OutlierAction>,
    /// Drop duplicate rows last.
    pub remove_duplicates: bool,
    /// Outlier rule.
    pub rule: IqrRule,
}

impl CleaningPlan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fill strategy.
    #[must_use]
    pub fn fill_missing(mut self, strategy: FillStrategy) -> Self {
        self.missing = Some(strategy);
        self
    }

    /// Sets the outlier action.
    #[must_use]
    pub fn outliers(mut self, action: OutlierAction) -> Self {
        self.outliers = Some(action);
        self
    }

    /// Enables or disables duplicate removal.
    #[must_use]
    pub fn remove_duplicates(mut self, enabled: bool) -> Self {
        self.remove_duplicates = enabled;
        self
    }

    /// Uses a custom outlier rule.
    #[must_use]
    pub fn with_rule(mut self, rule: IqrRule) -> Self {
        self.rule = rule;
        self
    }

    /// True if the plan does nothing.
    pub fn is_empty(&self) -> bool {
        self.missing.is_none() && self.outliers.is_none() && !self.remove_duplicates
    }

    /// The concrete transforms for `snapshot`'s numeric columns.
    fn chain_for(&self, snapshot: &Snapshot) -> Chain {
        let numeric: Vec<String> = snapshot
            .numeric_indices()
            .into_iter()
            .map(|idx| snapshot.column_name(idx))
            .collect();

        let mut chain = Chain::new();
        if let Some(strategy) = self.missing {
            for name in &numeric {
                chain = chain.then(FillMissing::new(name.as_str(), strategy));
            }
        }
        if let Some(action) = self.outliers {
            for name in &numeric {
                chain = match action {
                    OutlierAction::Cap => {
                        chain.then(CapOutliers::new(name.as_str()).with_rule(self.rule))
                    }
                    OutlierAction::Remove => {
                        chain.then(RemoveOutliers::new(name.as_str()).with_rule(self.rule))
                    }
                };
            }
        }
        if self.remove_duplicates {
            chain = chain.then(RemoveDuplicates);
        }
        chain
    }
}

impl Transform for CleaningPlan {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let chain = self.chain_for(snapshot);
        tracing::debug!(steps = chain.len(), "running cleaning plan");
        chain.apply(snapshot)
    }

    fn describe(&self) -> String {
        "Custom cleaning applied".to_string()
    }
}
