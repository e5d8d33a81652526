//! Scale helpers shared by the heuristic scorers.

/// Upper bound for any single model's score. No heuristic claims certainty.
pub const MAX_MODEL_SCORE: f64 = 98.0;

/// Centre and scale a measurement: `(value − center) / scale`.
pub fn standardise(value: f64, center: f64, scale: f64) -> f64 {
    if scale.abs() < 1e-10 {
        return 0.0;
    }
    (value - center) / scale
}

/// Min-max normalisation within a given range [min_val, max_val].
pub fn minmax_normalise(value: f64, min_val: f64, max_val: f64) -> f64 {
    if (max_val - min_val).abs() < 1e-10 {
        return 0.5; // degenerate case
    }
    ((value - min_val) / (max_val - min_val)).clamp(0.0, 1.0)
}

/// Logistic link mapped onto the 0–100 percent scale.
pub fn logistic_percent(log_odds: f64) -> f64 {
    100.0 / (1.0 + (-log_odds).exp())
}

/// Clamp a model score into `[0, MAX_MODEL_SCORE]`. NaN maps to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, MAX_MODEL_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardise() {
        assert_eq!(standardise(70.0, 50.0, 10.0), 2.0);
        assert_eq!(standardise(5.0, 5.0, 0.0), 0.0);
    }

    #[test]
    fn test_minmax_normalisation() {
        assert_eq!(minmax_normalise(-1.0, -2.0, 0.0), 0.5);
        assert_eq!(minmax_normalise(10.0, 0.0, 5.0), 1.0);
        assert_eq!(minmax_normalise(3.0, 3.0, 3.0), 0.5);
    }

    #[test]
    fn test_logistic_midpoint_and_tails() {
        assert!((logistic_percent(0.0) - 50.0).abs() < 1e-9);
        assert!(logistic_percent(-10.0) < 0.01);
        assert!(logistic_percent(10.0) > 99.99);
    }

    #[test]
    fn test_clamp_score_caps_at_98() {
        assert_eq!(clamp_score(120.0), MAX_MODEL_SCORE);
        assert_eq!(clamp_score(-4.0), 0.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
    }
}
