//! Descriptive statistics over peer-group values.
//!
//! Conventions:
//!   - Standard deviation is the population form (divisor N).
//!   - MAD is the unscaled median of absolute deviations from the median.
//!   - Percentiles interpolate linearly between closest ranks.
//!   - A zero dispersion yields an undefined (None) score, never an error.

use serde::{Deserialize, Serialize};

/// Scale factor turning a MAD-based deviation into a normal-consistent unit.
pub const ROBUST_Z_SCALE: f64 = 0.6745;

pub const DEFAULT_LOWER_PCT: f64 = 1.0;
pub const DEFAULT_UPPER_PCT: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinsorBounds {
    pub lower: f64,
    pub upper: f64,
}

impl WinsorBounds {
    pub fn clip(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Winsorized {
    pub values: Vec<Option<f64>>,
    /// None when every input value was missing.
    pub bounds: Option<WinsorBounds>,
}

/// Central tendency and dispersion of a non-empty sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dispersion {
    pub mean:   f64,
    pub std:    f64,
    pub median: f64,
    pub mad:    f64,
}

impl Dispersion {
    /// Returns None for an empty sample.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let std = population_std(values)?;
        let median = median(values)?;
        let mad = mad(values, median)?;
        Some(Self { mean, std, median, mad })
    }

    pub fn z_score(&self, value: f64) -> Option<f64> {
        z_score(value, self.mean, self.std)
    }

    pub fn robust_z_score(&self, value: f64) -> Option<f64> {
        robust_z_score(value, self.median, self.mad)
    }
}

fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let s = sorted(values);
    let mid = s.len() / 2;
    if s.len() % 2 == 1 {
        Some(s[mid])
    } else {
        Some((s[mid - 1] + s[mid]) / 2.0)
    }
}

/// Median absolute deviation from `center`.
pub fn mad(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Percentile `pct` in [0, 100] of an ascending slice, linear interpolation.
/// None for an empty slice or a non-finite `pct`.
pub fn percentile_sorted(sorted_values: &[f64], pct: f64) -> Option<f64> {
    if !pct.is_finite() {
        return None;
    }
    let first = *sorted_values.first()?;
    if sorted_values.len() == 1 {
        return Some(first);
    }
    let pos = (pct.clamp(0.0, 100.0) / 100.0) * (sorted_values.len() - 1) as f64;
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = sorted_values[idx];
    let b = sorted_values[(idx + 1).min(sorted_values.len() - 1)];
    Some(a + (b - a) * frac)
}

pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    percentile_sorted(&sorted(values), pct)
}

/// Clip present values to the [lower_pct, upper_pct] percentiles computed
/// over the present values only. Missing values pass through. Swapped
/// percentiles are reordered; a non-finite one leaves values untouched.
pub fn winsorize(values: &[Option<f64>], lower_pct: f64, upper_pct: f64) -> Winsorized {
    let clean: Vec<f64> = values.iter().filter_map(|v| present(*v)).collect();
    let s = sorted(&clean);
    let bounds = match (percentile_sorted(&s, lower_pct), percentile_sorted(&s, upper_pct)) {
        (Some(a), Some(b)) => WinsorBounds {
            lower: a.min(b),
            upper: a.max(b),
        },
        _ => {
            return Winsorized {
                values: values.to_vec(),
                bounds: None,
            }
        }
    };
    let clipped = values
        .iter()
        .map(|v| present(*v).map(|x| bounds.clip(x)))
        .collect();
    Winsorized {
        values: clipped,
        bounds: Some(bounds),
    }
}

pub fn z_score(value: f64, mean: f64, std: f64) -> Option<f64> {
    (std > 0.0).then(|| (value - mean) / std)
}

pub fn robust_z_score(value: f64, median: f64, mad: f64) -> Option<f64> {
    (mad > 0.0).then(|| ROBUST_Z_SCALE * (value - median) / mad)
}

/// Tie-aware rank of every value (ties share their mean 1-based rank),
/// as a percentage of the sample size.
pub fn average_rank_pct(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // 1-based positions start+1 ..= end share their mean.
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg_rank / n as f64 * 100.0;
        }
        start = end;
    }
    ranks
}

/// Share of `distribution` strictly below `value`, in percent.
pub fn percent_below(distribution: &[f64], value: f64) -> Option<f64> {
    if value.is_nan() {
        return None;
    }
    let clean: Vec<f64> = distribution.iter().copied().filter(|v| !v.is_nan()).collect();
    if clean.is_empty() {
        return None;
    }
    let below = clean.iter().filter(|v| **v < value).count();
    Some(below as f64 / clean.len() as f64 * 100.0)
}
