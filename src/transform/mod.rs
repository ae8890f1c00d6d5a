//! Cleaning transforms.
//!
//! A [`Transform`] maps one [`Snapshot`] to a new one; the input is never
//! modified. Single-column transforms look their column up by name and fail
//! with [`Error::ColumnNotFound`] when it is absent, and numeric-only
//! transforms fail with [`Error::NotNumeric`] on a text column. Degenerate
//! but well-typed input (no rows, an all-missing column) is returned
//! unchanged.
//!
//! Transforms compose with [`Chain`]; [`CleaningPlan`], [`ApplySuggestion`]
//! and [`ApplyAll`] build the operations the workspace commits.

use std::sync::Arc;

use arrow::array::Float64Array;

use crate::{
    error::{Error, Result},
    snapshot::Snapshot,
};

mod convert;
mod fill;
mod outliers;
mod plan;
mod rows;

pub use convert::ConvertNumeric;
pub use fill::{FillMissing, FillStrategy};
pub use outliers::CapOutliers;
pub use plan::{remedy, ApplyAll, ApplySuggestion, CleaningPlan, OutlierAction};
pub use rows::{RemoveDuplicates, RemoveOutliers};

/// An operation producing a new snapshot from an existing one.
///
/// Implementations must be pure: the same input always yields the same
/// output.
pub trait Transform: Send + Sync {
    /// Applies the transform.
    ///
    /// # Errors
    ///
    /// Returns an error if the transform cannot be applied to `snapshot`.
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot>;

    /// Short human-readable description, recorded as the version action.
    fn describe(&self) -> String;
}

/// A chain of transforms applied in sequence.
///
/// # Example
///
/// ```
/// use tidyset::{
///     transform::{Chain, FillMissing, FillStrategy, RemoveDuplicates, Transform},
///     Column, Snapshot,
/// };
///
/// let snapshot = Snapshot::from_columns([
///     ("v", Column::numeric([Some(1.0), Some(1.0), None])),
/// ])
/// .unwrap();
///
/// let chain = Chain::new()
///     .then(RemoveDuplicates)
///     .then(FillMissing::new("v", FillStrategy::Median));
///
/// let cleaned = chain.apply(&snapshot).unwrap();
/// assert_eq!(cleaned.num_rows(), 2);
/// assert_eq!(cleaned.total_missing(), 0);
/// ```
pub struct Chain {
    transforms: Vec<Box<dyn Transform>>,
}

impl Chain {
    /// Creates a new empty transform chain.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Adds a transform to the chain.
    #[must_use]
    pub fn then<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(Box::new(transform));
        self
    }

    /// Adds an already boxed transform to the chain.
    #[must_use]
    pub fn then_boxed(mut self, transform: Box<dyn Transform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// Returns the number of transforms in the chain.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Returns true if the chain has no transforms.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform for Chain {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let mut result = snapshot.clone();
        for transform in &self.transforms {
            result = transform.apply(&result)?;
        }
        Ok(result)
    }

    fn describe(&self) -> String {
        self.transforms
            .iter()
            .map(|t| t.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Transform for Box<dyn Transform> {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        (**self).apply(snapshot)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl Transform for Arc<dyn Transform> {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        (**self).apply(snapshot)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Index and values of a numeric column, or `NotNumeric`.
fn numeric_column<'a>(snapshot: &'a Snapshot, column: &str) -> Result<(usize, &'a Float64Array)> {
    let idx = snapshot.column_index(column)?;
    let arr = snapshot
        .numeric_array(idx)
        .ok_or_else(|| Error::not_numeric(column))?;
    Ok((idx, arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Column;

    fn sample() -> Snapshot {
        Snapshot::from_columns([
            (
                "v",
                Column::numeric([Some(1.0), Some(1.0), None, Some(4.0)]),
            ),
            ("t", Column::text([Some("a"), Some("a"), Some("b"), None])),
        ])
        .expect("snapshot")
    }

    #[test]
    fn test_chain_applies_in_order() {
        let chain = Chain::new()
            .then(RemoveDuplicates)
            .then(FillMissing::new("v", FillStrategy::Mean));

        assert_eq!(chain.len(), 2);
        assert!(!chain.is_empty());

        let result = chain.apply(&sample()).expect("apply");
        assert_eq!(result.num_rows(), 3);
        assert_eq!(
            result.column("v").expect("v"),
            Column::numeric([Some(1.0), Some(2.5), Some(4.0)])
        );
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let snap = sample();
        let chain = Chain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.apply(&snap).expect("apply"), snap);
    }

    #[test]
    fn test_chain_error_propagation() {
        let chain = Chain::new()
            .then(RemoveDuplicates)
            .then(CapOutliers::new("t"));
        let err = chain.apply(&sample()).expect_err("text column");
        assert!(matches!(err, Error::NotNumeric { .. }));
    }

    #[test]
    fn test_chain_describe() {
        let chain = Chain::new()
            .then(RemoveDuplicates)
            .then(CapOutliers::new("v"));
        assert_eq!(
            chain.describe(),
            "Removed duplicate rows, Capped outliers in v"
        );
    }

    #[test]
    fn test_boxed_and_arc_delegation() {
        let snap = sample();
        let boxed: Box<dyn Transform> = Box::new(RemoveDuplicates);
        assert_eq!(boxed.apply(&snap).expect("boxed").num_rows(), 3);

        let shared: Arc<dyn Transform> = Arc::new(RemoveDuplicates);
        assert_eq!(shared.apply(&snap).expect("arc").num_rows(), 3);
        assert_eq!(shared.describe(), boxed.describe());
    }

    #[test]
    fn test_input_is_not_modified() {
        let snap = sample();
        let before = snap.clone();
        let _ = FillMissing::new("v", FillStrategy::Auto)
            .apply(&snap)
            .expect("fill");
        assert_eq!(snap, before);
    }

    #[test]
    fn test_with_transform() {
        let snap = sample();
        let result = snap.with_transform(&RemoveDuplicates).expect("dedup");
        assert_eq!(result.num_rows(), 3);
    }
}
