//! Ensemble aggregation.
//!
//! final = clamp(calibrate(penalise(Σ wᵢ·scoreᵢ)), 0, 100)
//!
//! Each step is a separate function so the convex weighted mean can be
//! tested on its own, apart from the two deliberate multiplicative
//! adjustments that follow it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cardiosense_common::confidence::{agreement_score, combined_confidence, confidence_interval, variance};
use cardiosense_common::{PopulationGroup, RiskLevel, ScoringConfig};

use crate::classifier::RiskThresholds;
use crate::model::ModelPrediction;
use crate::weights::normalised_weights;

/// Score reported when no model produced a prediction.
pub const SAFE_DEFAULT_SCORE: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    pub variance_threshold: f64,
    pub disagreement_penalty: f64,
    pub calibration: HashMap<PopulationGroup, f64>,
    pub thresholds: RiskThresholds,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self::from(&ScoringConfig::default())
    }
}

impl From<&ScoringConfig> for EnsembleConfig {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            variance_threshold: config.variance_threshold,
            disagreement_penalty: config.disagreement_penalty,
            calibration: config.calibration.clone(),
            thresholds: RiskThresholds::from(config),
        }
    }
}

impl EnsembleConfig {
    /// Multiplier for the patient's own group; groups missing from the
    /// table are left uncalibrated.
    pub fn calibration_for(&self, group: PopulationGroup) -> f64 {
        self.calibration.get(&group).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    /// Calibrated score in [0, 100]
    pub final_score: f64,
    pub risk_level: RiskLevel,
    /// 100 − σ of model scores, in [0, 100]
    pub model_agreement: f64,
    /// 95% interval around the weighted score
    pub confidence_interval: (f64, f64),
    /// Convex combination of model scores, before adjustments
    pub weighted_score: f64,
    pub disagreement_penalty_applied: bool,
    pub calibration_factor: f64,
    /// Ensemble confidence, 0–100
    pub confidence: f64,
    pub model_count: usize,
    /// True when produced by the empty-input safe default
    pub degraded: bool,
}

/// Σ wᵢ·scoreᵢ with normalised weights. `None` for an empty list.
pub fn weighted_score(predictions: &[ModelPrediction]) -> Option<f64> {
    if predictions.is_empty() {
        return None;
    }
    let weights = normalised_weights(predictions);
    Some(predictions.iter().zip(weights).map(|(p, w)| p.score * w).sum())
}

/// Push the estimate upward when models disagree beyond the threshold.
/// Returns the adjusted score and whether the penalty fired.
pub fn apply_disagreement_penalty(score: f64, score_variance: f64, config: &EnsembleConfig) -> (f64, bool) {
    if score_variance > config.variance_threshold {
        (score * config.disagreement_penalty, true)
    } else {
        (score, false)
    }
}

pub fn apply_calibration(score: f64, factor: f64) -> f64 {
    score * factor
}

/// Combine predictions into the final ensemble result.
pub fn aggregate(
    predictions: &[ModelPrediction],
    population: PopulationGroup,
    config: &EnsembleConfig,
) -> EnsembleResult {
    let Some(weighted) = weighted_score(predictions) else {
        tracing::warn!("no model predictions available, returning safe default");
        return safe_default(config);
    };

    let scores: Vec<f64> = predictions.iter().map(|p| p.score).collect();
    let score_variance = variance(&scores);

    let (penalised, penalty_applied) = apply_disagreement_penalty(weighted, score_variance, config);
    let calibration_factor = config.calibration_for(population);
    let final_score = apply_calibration(penalised, calibration_factor).clamp(0.0, 100.0);

    let agreement = agreement_score(&scores);
    let confidences: Vec<f64> = predictions.iter().map(|p| p.confidence).collect();

    tracing::debug!(
        models = predictions.len(),
        weighted = weighted,
        variance = score_variance,
        penalty_applied,
        calibration_factor,
        final_score,
        "ensemble aggregated"
    );

    EnsembleResult {
        final_score,
        risk_level: config.thresholds.classify(final_score),
        model_agreement: agreement,
        confidence_interval: confidence_interval(weighted, &scores),
        weighted_score: weighted,
        disagreement_penalty_applied: penalty_applied,
        calibration_factor,
        confidence: combined_confidence(&confidences, agreement),
        model_count: predictions.len(),
        degraded: false,
    }
}

/// Mid-scale score with zero agreement and a full-width interval. It lands
/// in the very-high band under the default table, so downstream advice
/// always recommends seeing a clinician.
fn safe_default(config: &EnsembleConfig) -> EnsembleResult {
    EnsembleResult {
        final_score: SAFE_DEFAULT_SCORE,
        risk_level: config.thresholds.classify(SAFE_DEFAULT_SCORE),
        model_agreement: 0.0,
        confidence_interval: (0.0, 100.0),
        weighted_score: SAFE_DEFAULT_SCORE,
        disagreement_penalty_applied: false,
        calibration_factor: 1.0,
        confidence: 0.0,
        model_count: 0,
        degraded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelFamily;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn pred(name: &str, score: f64, weight: f64, accuracy: f64) -> ModelPrediction {
        ModelPrediction {
            name: name.to_string(),
            family: ModelFamily::ClinicalValidated,
            score,
            confidence: 80.0,
            risk_level: RiskThresholds::default().classify(score),
            weight,
            accuracy,
        }
    }

    #[test]
    fn test_weighted_score_uses_accuracy() {
        // effective weights 0.9 and 0.45 → 2/3 and 1/3
        let preds = vec![pred("a", 30.0, 1.0, 0.9), pred("b", 60.0, 1.0, 0.45)];
        let w = weighted_score(&preds).unwrap();
        assert!((w - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_is_isolated_step() {
        let config = EnsembleConfig::default();
        assert_eq!(apply_disagreement_penalty(50.0, 100.0, &config), (50.0, false));
        let (score, applied) = apply_disagreement_penalty(50.0, 400.0, &config);
        assert!(applied);
        assert!((score - 55.0).abs() < 1e-9);
    }

    #[test]
    fn test_penalty_fires_on_disagreement() {
        // scores 10 and 70: variance 900 > 225
        let preds = vec![pred("a", 10.0, 1.0, 1.0), pred("b", 70.0, 1.0, 1.0)];
        let result = aggregate(&preds, PopulationGroup::General, &EnsembleConfig::default());
        assert!(result.disagreement_penalty_applied);
        assert!((result.weighted_score - 40.0).abs() < 1e-9);
        assert!((result.final_score - 44.0).abs() < 1e-9);
        assert_eq!(result.model_agreement, 70.0);
    }

    #[test]
    fn test_calibration_applies_after_penalty() {
        let preds = vec![pred("a", 20.0, 1.0, 1.0), pred("b", 20.0, 1.0, 1.0)];
        let result = aggregate(&preds, PopulationGroup::SouthAsian, &EnsembleConfig::default());
        assert!(!result.disagreement_penalty_applied);
        assert_eq!(result.calibration_factor, 1.15);
        assert!((result.final_score - 23.0).abs() < 1e-9);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_unknown_group_is_uncalibrated() {
        let mut config = EnsembleConfig::default();
        config.calibration.remove(&PopulationGroup::Hispanic);
        assert_eq!(config.calibration_for(PopulationGroup::Hispanic), 1.0);
        assert_eq!(config.calibration_for(PopulationGroup::SouthAsian), 1.15);
    }

    #[test]
    fn test_final_score_clamped_to_100() {
        let preds = vec![pred("a", 0.0, 1.0, 1.0), pred("b", 98.0, 10.0, 1.0)];
        let mut config = EnsembleConfig::default();
        config.calibration.insert(PopulationGroup::SouthAsian, 1.5);
        let result = aggregate(&preds, PopulationGroup::SouthAsian, &config);
        assert_eq!(result.final_score, 100.0);
    }

    #[test]
    fn test_empty_predictions_safe_default() {
        let result = aggregate(&[], PopulationGroup::General, &EnsembleConfig::default());
        assert_eq!(
            result,
            EnsembleResult {
                final_score: 50.0,
                risk_level: RiskLevel::VeryHigh,
                model_agreement: 0.0,
                confidence_interval: (0.0, 100.0),
                weighted_score: 50.0,
                disagreement_penalty_applied: false,
                calibration_factor: 1.0,
                confidence: 0.0,
                model_count: 0,
                degraded: true,
            }
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn test_weighted_score_is_convex(
            entries in prop::collection::vec((0.0f64..=98.0, 0.0f64..3.0, 0.05f64..=1.0), 1..20)
        ) {
            let preds: Vec<ModelPrediction> = entries
                .iter()
                .enumerate()
                .map(|(i, (s, w, a))| pred(&format!("m{i}"), *s, *w, *a))
                .collect();
            let w = weighted_score(&preds).unwrap();
            let min = entries.iter().map(|e| e.0).fold(f64::INFINITY, f64::min);
            let max = entries.iter().map(|e| e.0).fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(w >= min - 1e-9 && w <= max + 1e-9, "{} not in [{}, {}]", w, min, max);
        }

        #[test]
        fn test_final_score_bounded(
            scores in prop::collection::vec(0.0f64..=98.0, 0..20),
            group_index in 0usize..6
        ) {
            let groups = [
                PopulationGroup::General,
                PopulationGroup::SouthAsian,
                PopulationGroup::EastAsian,
                PopulationGroup::African,
                PopulationGroup::Hispanic,
                PopulationGroup::European,
            ];
            let preds: Vec<ModelPrediction> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| pred(&format!("m{i}"), *s, 1.0, 0.8))
                .collect();
            let r = aggregate(&preds, groups[group_index], &EnsembleConfig::default());
            prop_assert!(r.final_score >= 0.0 && r.final_score <= 100.0);
            prop_assert!(r.confidence_interval.0 <= r.confidence_interval.1);
        }
    }
}
