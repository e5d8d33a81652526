//! Ensemble weights: static weight × accuracy constant, renormalised over
//! whichever models actually produced a prediction.

use serde::{Deserialize, Serialize};

use crate::model::{ModelFamily, ModelPrediction, ModelSpec};

/// Un-normalised voting weight of one model.
pub fn effective_weight(weight: f64, accuracy: f64) -> f64 {
    let w = weight * accuracy;
    if w.is_finite() && w > 0.0 { w } else { 0.0 }
}

/// Normalised weights for a prediction list, in the same order.
/// Sum to 1.0 for any non-empty list; if every effective weight is zero the
/// models vote equally.
pub fn normalised_weights(predictions: &[ModelPrediction]) -> Vec<f64> {
    let raw: Vec<f64> = predictions
        .iter()
        .map(|p| effective_weight(p.weight, p.accuracy))
        .collect();
    normalise(raw)
}

fn normalise(raw: Vec<f64>) -> Vec<f64> {
    let n = raw.len();
    if n == 0 {
        return raw;
    }
    let sum: f64 = raw.iter().sum();
    if sum > 0.0 {
        raw.into_iter().map(|w| w / sum).collect()
    } else {
        vec![1.0 / n as f64; n]
    }
}

/// One row of the model-info weight table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub name: String,
    pub family: ModelFamily,
    pub weight: f64,
    pub accuracy: f64,
    pub normalised: f64,
}

/// Weight table for a bank, as if every model reported.
pub fn weight_table(specs: &[&ModelSpec]) -> Vec<WeightEntry> {
    let normalised = normalise(specs.iter().map(|s| effective_weight(s.weight, s.accuracy)).collect());
    specs
        .iter()
        .zip(normalised)
        .map(|(s, n)| WeightEntry {
            name: s.name.clone(),
            family: s.family,
            weight: s.weight,
            accuracy: s.accuracy,
            normalised: n,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::ModelBank;
    use cardiosense_common::RiskLevel;

    fn pred(weight: f64, accuracy: f64) -> ModelPrediction {
        ModelPrediction {
            name: "m".into(),
            family: ModelFamily::MlAdvanced,
            score: 10.0,
            confidence: 80.0,
            risk_level: RiskLevel::Medium,
            weight,
            accuracy,
        }
    }

    #[test]
    fn test_standard_weights_sum_to_one() {
        let bank = ModelBank::standard();
        let table = weight_table(&bank.specs());
        let weights: Vec<f64> = table.iter().map(|e| e.normalised).collect();
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "Normalised weights must sum to 1.0");
    }

    #[test]
    fn test_accuracy_scales_weight() {
        let w = normalised_weights(&[pred(1.0, 0.9), pred(1.0, 0.45)]);
        assert!((w[0] - 2.0 / 3.0).abs() < 1e-9);
        assert!((w[1] - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_zero_weights_vote_equally() {
        let w = normalised_weights(&[pred(0.0, 0.9), pred(0.0, 0.9), pred(0.0, 0.9), pred(0.0, 0.9)]);
        assert_eq!(w, vec![0.25; 4]);
    }

    #[test]
    fn test_empty_list() {
        assert!(normalised_weights(&[]).is_empty());
    }
}
