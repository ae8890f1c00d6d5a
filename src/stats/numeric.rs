//! Order statistics and the IQR outlier rule.

use std::collections::BTreeMap;

use arrow::array::{Float64Array, StringArray};
use serde::{Deserialize, Serialize};

use crate::snapshot::parse_number;

/// Non-missing values of a numeric column, in row order.
pub fn present_values(array: &Float64Array) -> Vec<f64> {
    array.iter().flatten().collect()
}

/// Returns a sorted copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile of already sorted values using linear interpolation between the
/// closest ranks. `None` for an empty slice.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let frac = h - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Median of unsorted values.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(&sorted(values), 0.5)
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample variance (n - 1 denominator). A single value has variance 0.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Most frequent value; ties go to the smallest.
pub fn numeric_mode(values: &[f64]) -> Option<f64> {
    let s = sorted(values);
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < s.len() {
        let mut j = i + 1;
        while j < s.len() && s[j] == s[i] {
            j += 1;
        }
        let run = j - i;
        if best.map_or(true, |(_, count)| run > count) {
            best = Some((s[i], run));
        }
        i = j;
    }
    best.map(|(value, _)| value)
}

/// Most frequent non-missing string; ties go to the lexicographically
/// smallest.
pub fn text_mode(array: &StringArray) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in array.iter().flatten() {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// True if the text column has at least one value and every non-missing
/// value parses as a number.
pub fn looks_numeric(array: &StringArray) -> bool {
    let mut any = false;
    for value in array.iter().flatten() {
        if parse_number(value).is_none() {
            return false;
        }
        any = true;
    }
    any
}

/// Lower and upper outlier fences derived from the quartiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fences {
    /// 25th percentile.
    pub q1: f64,
    /// 75th percentile.
    pub q3: f64,
    /// `q1 - k * iqr`.
    pub lower: f64,
    /// `q3 + k * iqr`.
    pub upper: f64,
}

impl Fences {
    /// Interquartile range.
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// True if `value` lies strictly outside the fences.
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }

    /// Clips `value` into `[lower, upper]`.
    pub fn clip(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }
}

/// The IQR rule with a configurable multiplier (1.5 by default).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrRule {
    /// Multiplier applied to the IQR.
    pub multiplier: f64,
}

impl Default for IqrRule {
    fn default() -> Self {
        Self { multiplier: 1.5 }
    }
}

impl IqrRule {
    /// Creates a rule with the given multiplier.
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }

    /// Fences for the given (unsorted) values; `None` when there are none.
    pub fn fences(&self, values: &[f64]) -> Option<Fences> {
        let s = sorted(values);
        let q1 = quantile(&s, 0.25)?;
        let q3 = quantile(&s, 0.75)?;
        let iqr = q3 - q1;
        Some(Fences {
            q1,
            q3,
            lower: q1 - self.multiplier * iqr,
            upper: q3 + self.multiplier * iqr,
        })
    }

    /// Number of values outside the fences.
    pub fn count_outliers(&self, values: &[f64]) -> usize {
        match self.fences(values) {
            Some(f) => values.iter().filter(|&&v| f.is_outlier(v)).count(),
            None => 0,
        }
    }
}
