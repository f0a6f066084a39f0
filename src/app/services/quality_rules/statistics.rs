//! Quantile and IQR fence calculations for numeric record fields
//!
//! Quantiles use linear interpolation between adjacent order statistics:
//! rank = p * (n - 1).

use crate::constants::{IQR_FENCE_MULTIPLIER, LOWER_QUARTILE, UPPER_QUARTILE};

/// Sort values ascending, dropping NaN
pub fn sorted_values(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Linear-interpolation quantile of already sorted values
///
/// Returns `None` for an empty slice or a `p` outside [0, 1].
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let rank = p * (sorted.len() - 1) as f64;
    let lower_index = rank.floor() as usize;
    let upper_index = rank.ceil() as usize;
    let fraction = rank - lower_index as f64;

    let a = sorted[lower_index];
    let b = sorted[upper_index];
    if lower_index == upper_index || a == b {
        return Some(a);
    }

    // Two-sided lerp: exact at both endpoints
    let diff = b - a;
    if fraction >= 0.5 {
        Some(b - diff * (1.0 - fraction))
    } else {
        Some(a + diff * fraction)
    }
}

/// Tukey fences derived from the interquartile range of a sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFences {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrFences {
    /// Compute fences from unsorted values; `None` when no values are present
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let sorted = sorted_values(values);
        Self::from_sorted(&sorted)
    }

    /// Compute fences from sorted values
    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        let q1 = quantile(sorted, LOWER_QUARTILE)?;
        let q3 = quantile(sorted, UPPER_QUARTILE)?;
        let iqr = q3 - q1;

        Some(Self {
            q1,
            q3,
            lower: q1 - IQR_FENCE_MULTIPLIER * iqr,
            upper: q3 + IQR_FENCE_MULTIPLIER * iqr,
        })
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// True when `value` falls strictly outside `[lower, upper]`
    pub fn is_outlier(&self, value: f64) -> bool {
        value < self.lower || value > self.upper
    }
}
