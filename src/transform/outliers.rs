//! Outlier capping.

use super::{numeric_column, Transform};
use crate::{
    error::Result,
    snapshot::{Column, Snapshot},
    stats::{Fences, IqrRule},
};

/// Clips the values of a numeric column into its IQR fences.
///
/// Clipping moves the quartiles of very small columns, which can turn a
/// clipped value into an outlier of the new fences. Values that are still
/// outliers after the clip are clamped to the nearest value of the column
/// that lies inside the recomputed fences. Each clamp removes at least one
/// distinct value, so this settles within the column length and a second
/// application is a no-op.
#[derive(Debug, Clone)]
pub struct CapOutliers {
    column: String,
    rule: IqrRule,
}

impl CapOutliers {
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

impl Transform for CapOutliers {
    fn apply(&self, snapshot: &Snapshot) -> Result<Snapshot> {
        let (idx, arr) = numeric_column(snapshot, &self.column)?;
        let mut values: Vec<Option<f64>> = arr.iter().collect();
        let max_passes = values.len() + 1;
        let mut passes = 0;

        while passes < max_passes {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            let Some(fences) = self.rule.fences(&present) else {
                break;
            };
            if !present.iter().any(|v| fences.is_outlier(*v)) {
                break;
            }
            if passes == 0 {
                for v in values.iter_mut().flatten() {
                    *v = fences.clip(*v);
                }
            } else {
                clamp_to_inliers(&mut values, &present, fences);
            }
            passes += 1;
        }

        if passes == 0 {
            return Ok(snapshot.clone());
        }
        tracing::debug!(column = %self.column, passes, "capped outliers");
        snapshot.replace_column(idx, Column::numeric(values))
    }

    fn describe(&self) -> String {
        format!("Capped outliers in {}", self.column)
    }
}

/// Replaces outliers with the smallest or largest column value inside
/// `fences`, falling back to the fence itself.
fn clamp_to_inliers(values: &mut [Option<f64>], present: &[f64], fences: Fences) {
    let inliers = present.iter().copied().filter(|v| !fences.is_outlier(*v));
    let (low, high) = inliers.fold((None, None), |(lo, hi): (Option<f64>, Option<f64>), v| {
        (
            Some(lo.map_or(v, |lo| lo.min(v))),
            Some(hi.map_or(v, |hi| hi.max(v))),
        )
    });
    for v in values.iter_mut().flatten() {
        if *v < fences.lower {
            *v = low.unwrap_or(fences.lower);
        } else if *v > fences.upper {
            *v = high.unwrap_or(fences.upper);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, stats::present_values};

    fn column_of(values: &[f64]) -> Snapshot {
        Snapshot::from_columns([("v", Column::numeric(values.iter().copied().map(Some)))])
            .expect("snapshot")
    }

    #[test]
    fn test_cap_clips_to_fences() {
        let snap = column_of(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let capped = CapOutliers::new("v").apply(&snap).expect("cap");
        let arr = capped.numeric_array(0).expect("numeric");
        let values = present_values(arr);
        // q1 = 2.25, q3 = 4.75, upper = 8.5
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 8.5]);
        assert_eq!(IqrRule::default().count_outliers(&values), 0);
    }

    #[test]
    fn test_cap_converges_on_small_columns() {
        let snap = column_of(&[0.0, 1.0, 2.0, 1000.0]);
        let capped = CapOutliers::new("v").apply(&snap).expect("cap");
        let values = present_values(capped.numeric_array(0).expect("numeric"));
        assert_eq!(IqrRule::default().count_outliers(&values), 0);
    }

    #[test]
    fn test_cap_is_idempotent() {
        for (values, expected) in [
            (vec![0.0, 1.0, 2.0, 1000.0], vec![0.0, 1.0, 2.0, 2.0]),
            (
                vec![-50.0, 1.0, 2.0, 3.0, 4.0, 90.0],
                vec![-2.5, 1.0, 2.0, 3.0, 4.0, 7.5],
            ),
            (vec![5.0, 5.0, 5.0, 6.0], vec![5.0, 5.0, 5.0, 5.0]),
            (vec![0.0, 0.0, 0.0, 7.0], vec![0.0, 0.0, 0.0, 0.0]),
        ] {
            let once = CapOutliers::new("v").apply(&column_of(&values)).expect("once");
            let capped = present_values(once.numeric_array(0).expect("numeric"));
            assert_eq!(capped, expected, "{values:?}");
            let twice = CapOutliers::new("v").apply(&once).expect("twice");
            assert_eq!(once, twice, "{values:?}");
        }
    }

    #[test]
    fn test_cap_clamps_to_column_values_not_fences() {
        // first clip gives 4.375, which is an outlier of the new fences
        let snap = column_of(&[0.0, 0.0, 0.0, 7.0]);
        let capped = CapOutliers::new("v").apply(&snap).expect("cap");
        let values = present_values(capped.numeric_array(0).expect("numeric"));
        assert!(values.iter().all(|v| *v == 0.0), "{values:?}");
    }

    #[test]
    fn test_cap_keeps_missing() {
        let snap = Snapshot::from_columns([(
            "v",
            Column::numeric([Some(1.0), None, Some(2.0), Some(3.0), Some(4.0), Some(50.0)]),
        )])
        .expect("snapshot");
        let capped = CapOutliers::new("v").apply(&snap).expect("cap");
        assert_eq!(capped.missing_count(0), 1);
    }

    #[test]
    fn test_cap_without_outliers_is_identity() {
        let snap = column_of(&[1.0, 2.0, 3.0]);
        assert_eq!(CapOutliers::new("v").apply(&snap).expect("cap"), snap);
    }

    #[test]
    fn test_cap_text_column() {
        let snap = Snapshot::from_columns([("t", Column::text([Some("x")]))]).expect("snapshot");
        assert!(matches!(
            CapOutliers::new("t").apply(&snap),
            Err(Error::NotNumeric { .. })
        ));
    }

    #[test]
    fn test_cap_custom_rule() {
        let snap = column_of(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let tight = CapOutliers::new("v").with_rule(IqrRule::new(0.5));
        let capped = tight.apply(&snap).expect("cap");
        let values = present_values(capped.numeric_array(0).expect("numeric"));
        // q3 = 4.75, upper = 4.75 + 0.5 * 2.5
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
