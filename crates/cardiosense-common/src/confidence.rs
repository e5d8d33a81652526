//! Spread and agreement statistics over a set of model scores.
//! All scores are on the 0–100 scale.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by N, matching numpy's default `std`).
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Agreement between models: 100 minus the standard deviation of their
/// scores, clamped to [0, 100]. A single model agrees with itself.
pub fn agreement_score(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (100.0 - std_dev(values)).clamp(0.0, 100.0)
}

/// 95% interval around `center` using the standard error of `values`.
/// Returns `(lower, upper)` clamped to [0, 100].
pub fn confidence_interval(center: f64, values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 100.0);
    }
    let half_width = 1.96 * std_dev(values) / (values.len() as f64).sqrt();
    (
        (center - half_width).clamp(0.0, 100.0),
        (center + half_width).clamp(0.0, 100.0),
    )
}

/// Combine per-model confidences (0–100) with the agreement score into a
/// single ensemble confidence. Weighted 60/40 towards agreement.
pub fn combined_confidence(model_confidences: &[f64], agreement: f64) -> f64 {
    if model_confidences.is_empty() {
        return 0.0;
    }
    (mean(model_confidences) * 0.4 + agreement * 0.6).clamp(0.0, 100.0)
}
