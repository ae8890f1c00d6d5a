//! Pairwise Pearson correlation over numeric columns.

use arrow::array::Float64Array;
use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Square correlation matrix, rows and columns in `columns` order.
///
/// Entries are rounded to two decimals; pairs without a defined
/// correlation (fewer than two complete rows, or a constant side) hold 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Numeric column names.
    pub columns: Vec<String>,
    /// `values[i][j]` is the correlation of `columns[i]` with `columns[j]`.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Computes the matrix for every numeric column of the snapshot.
    pub fn compute(snapshot: &Snapshot) -> Self {
        let mut columns = Vec::new();
        let mut arrays: Vec<&Float64Array> = Vec::new();
        for idx in snapshot.numeric_indices() {
            if let Some(arr) = snapshot.numeric_array(idx) {
                columns.push(snapshot.column_name(idx));
                arrays.push(arr);
            }
        }

        let n = arrays.len();
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(arrays[i], arrays[j]).map_or(0.0, round2);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Self { columns, values }
    }

    /// Correlation between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }

    /// True if there are no numeric columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Pearson correlation over rows where both sides are present.
fn pearson(x: &Float64Array, y: &Float64Array) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some((a?, b?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Column;

    fn snap(columns: Vec<(&str, Column)>) -> Snapshot {
        Snapshot::from_columns(columns).expect("snapshot")
    }

    #[test]
    fn test_perfect_positive_and_negative() {
        let s = snap(vec![
            ("x", Column::numeric([Some(1.0), Some(2.0), Some(3.0)])),
            ("y", Column::numeric([Some(2.0), Some(4.0), Some(6.0)])),
            ("z", Column::numeric([Some(3.0), Some(2.0), Some(1.0)])),
            ("label", Column::text([Some("a"), Some("b"), Some("c")])),
        ]);
        let m = CorrelationMatrix::compute(&s);
        assert_eq!(m.columns, vec!["x", "y", "z"]);
        assert_eq!(m.get("x", "y"), Some(1.0));
        assert_eq!(m.get("x", "z"), Some(-1.0));
        assert_eq!(m.get("x", "x"), Some(1.0));
        assert_eq!(m.get("x", "label"), None);
    }

    #[test]
    fn test_pairwise_complete_rows() {
        let s = snap(vec![
            ("x", Column::numeric([Some(1.0), Some(2.0), None, Some(4.0)])),
            ("y", Column::numeric([Some(1.0), Some(2.0), Some(99.0), Some(4.0)])),
        ]);
        let m = CorrelationMatrix::compute(&s);
        assert_eq!(m.get("x", "y"), Some(1.0));
    }

    #[test]
    fn test_undefined_becomes_zero() {
        let s = snap(vec![
            ("constant", Column::numeric([Some(5.0), Some(5.0), Some(5.0)])),
            ("x", Column::numeric([Some(1.0), Some(2.0), Some(3.0)])),
            ("sparse", Column::numeric([Some(1.0), None, None])),
        ]);
        let m = CorrelationMatrix::compute(&s);
        assert_eq!(m.get("constant", "x"), Some(0.0));
        assert_eq!(m.get("constant", "constant"), Some(0.0));
        assert_eq!(m.get("sparse", "x"), Some(0.0));
    }

    #[test]
    fn test_rounded_to_two_decimals() {
        let s = snap(vec![
            ("x", Column::numeric([Some(1.0), Some(2.0), Some(3.0), Some(4.0)])),
            ("y", Column::numeric([Some(1.0), Some(3.0), Some(2.0), Some(4.0)])),
        ]);
        let r = CorrelationMatrix::compute(&s).get("x", "y").unwrap();
        assert_eq!(r, 0.8);
    }
}
