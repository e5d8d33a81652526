//! Distribution drift statistics over score samples.
//!
//! Two-sample Kolmogorov–Smirnov statistic and Population Stability Index.
//! This is a statistics utility: nothing in the service retrains or gates
//! on its output.

use serde::{Deserialize, Serialize};

use crate::normalise::minmax_normalise;

const PSI_BINS: usize = 10;
const PSI_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftThresholds {
    pub ks: f64,
    pub psi: f64,
}

impl Default for DriftThresholds {
    fn default() -> Self {
        Self { ks: 0.1, psi: 0.2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub ks_statistic: f64,
    pub psi: f64,
    pub ks_drift: bool,
    pub psi_drift: bool,
    pub drifted: bool,
    pub reference_size: usize,
    pub current_size: usize,
}

/// Largest vertical gap between the two empirical CDFs.
/// Returns 0.0 if either sample is empty.
pub fn ks_statistic(reference: &[f64], current: &[f64]) -> f64 {
    if reference.is_empty() || current.is_empty() {
        return 0.0;
    }
    let a = sorted(reference);
    let b = sorted(current);
    let (n, m) = (a.len() as f64, b.len() as f64);

    let (mut i, mut j) = (0usize, 0usize);
    let mut max_gap: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        max_gap = max_gap.max((i as f64 / n - j as f64 / m).abs());
    }
    max_gap
}

/// PSI over equal-width bins spanning the reference sample's range.
/// Empty bins are floored at a small epsilon so the log stays finite.
pub fn population_stability_index(reference: &[f64], current: &[f64]) -> f64 {
    if reference.is_empty() || current.is_empty() {
        return 0.0;
    }
    let min = reference.iter().copied().fold(f64::INFINITY, f64::min);
    let max = reference.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let expected = bin_fractions(reference, min, max);
    let actual = bin_fractions(current, min, max);

    expected
        .iter()
        .zip(actual.iter())
        .map(|(&e, &a)| {
            let (e, a) = (e.max(PSI_EPSILON), a.max(PSI_EPSILON));
            (a - e) * (a / e).ln()
        })
        .sum()
}

pub fn detect_drift(reference: &[f64], current: &[f64], thresholds: &DriftThresholds) -> DriftReport {
    let ks = ks_statistic(reference, current);
    let psi = population_stability_index(reference, current);
    let ks_drift = ks > thresholds.ks;
    let psi_drift = psi > thresholds.psi;

    if ks_drift || psi_drift {
        tracing::info!(ks, psi, "score distribution drift detected");
    }

    DriftReport {
        ks_statistic: ks,
        psi,
        ks_drift,
        psi_drift,
        drifted: ks_drift || psi_drift,
        reference_size: reference.len(),
        current_size: current.len(),
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| !x.is_nan()).collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    v
}

fn bin_fractions(values: &[f64], min: f64, max: f64) -> [f64; PSI_BINS] {
    let mut counts = [0usize; PSI_BINS];
    for &v in values {
        let position = minmax_normalise(v, min, max);
        let bin = ((position * PSI_BINS as f64) as usize).min(PSI_BINS - 1);
        counts[bin] += 1;
    }
    let total = values.len() as f64;
    counts.map(|c| c as f64 / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(n: usize, offset: f64) -> Vec<f64> {
        (0..n).map(|i| offset + i as f64 * 100.0 / n as f64).collect()
    }

    #[test]
    fn test_identical_samples_no_drift() {
        let a = uniform(200, 0.0);
        let report = detect_drift(&a, &a, &DriftThresholds::default());
        assert_eq!(report.ks_statistic, 0.0);
        assert!(report.psi.abs() < 1e-9);
        assert!(!report.drifted);
    }

    #[test]
    fn test_shifted_sample_drifts() {
        let reference = uniform(200, 0.0);
        let current = uniform(200, 30.0);
        let report = detect_drift(&reference, &current, &DriftThresholds::default());
        assert!(report.ks_statistic > 0.25);
        assert!(report.psi > 0.2);
        assert!(report.drifted);
    }

    #[test]
    fn test_ks_disjoint_samples_is_one() {
        assert_eq!(ks_statistic(&[1.0, 2.0, 3.0], &[10.0, 11.0]), 1.0);
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(ks_statistic(&[], &[1.0]), 0.0);
        assert_eq!(population_stability_index(&[1.0], &[]), 0.0);
    }
}
