//! Risk classifier: calibrated score → ordinal band.
//!
//! One canonical cut-point table is used everywhere: low < 10,
//! medium [10, 20), high [20, 40), very-high ≥ 40.

use serde::{Deserialize, Serialize};

use cardiosense_common::{RiskLevel, ScoringConfig};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high: f64,
    pub very_high: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self { medium: 10.0, high: 20.0, very_high: 40.0 }
    }
}

impl From<&ScoringConfig> for RiskThresholds {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            medium: config.medium_threshold,
            high: config.high_threshold,
            very_high: config.very_high_threshold,
        }
    }
}

impl RiskThresholds {
    /// Lower bounds are inclusive. NaN is treated as the most severe band
    /// so a broken score never reads as reassurance.
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score.is_nan() || score >= self.very_high {
            RiskLevel::VeryHigh
        } else if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_band_edges() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0.0), RiskLevel::Low);
        assert_eq!(t.classify(9.99), RiskLevel::Low);
        assert_eq!(t.classify(10.0), RiskLevel::Medium);
        assert_eq!(t.classify(20.0), RiskLevel::High);
        assert_eq!(t.classify(39.9), RiskLevel::High);
        assert_eq!(t.classify(40.0), RiskLevel::VeryHigh);
        assert_eq!(t.classify(100.0), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_from_config() {
        let config = ScoringConfig { high_threshold: 25.0, ..Default::default() };
        let t = RiskThresholds::from(&config);
        assert_eq!(t.classify(22.0), RiskLevel::Medium);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn test_classifier_monotonic(a in 0.0f64..100.0, b in 0.0f64..100.0) {
            let t = RiskThresholds::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(t.classify(lo) <= t.classify(hi));
        }
    }
}
