//! Common interface for every model in the bank.
//!
//! The "models" are fixed-coefficient heuristics that emulate the shape of
//! published risk equations and common ML model families. They are not
//! trained and carry no statistical validation; treat their outputs as
//! placeholders for educational use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cardiosense_common::RiskLevel;

use crate::classifier::RiskThresholds;
use crate::features::PatientFeatures;
use crate::normalise::clamp_score;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("external scorer '{name}' failed: {reason}")]
    External { name: String, reason: String },

    #[error("external scorer '{name}' returned an unusable score: {score}")]
    InvalidScore { name: String, score: f64 },

    #[error("invalid weight for model '{name}': weight={weight}, accuracy={accuracy}")]
    InvalidWeight { name: String, weight: f64, accuracy: f64 },

    #[error("model '{0}' is already registered")]
    DuplicateModel(String),
}

/// Model family, used for reporting and model-info output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    ClinicalValidated,
    MlAdvanced,
    PopulationSpecific,
    BiomarkerEnhanced,
    /// Optional scorer backed by an external service (e.g. an LLM)
    External,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::ClinicalValidated  => "clinical-validated",
            ModelFamily::MlAdvanced         => "ml-advanced",
            ModelFamily::PopulationSpecific => "population-specific",
            ModelFamily::BiomarkerEnhanced  => "biomarker-enhanced",
            ModelFamily::External           => "external",
        }
    }
}

/// Static description of a model: identity plus its voting constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub family: ModelFamily,
    /// Static ensemble weight before accuracy adjustment
    pub weight: f64,
    /// Reported accuracy constant in (0, 1]
    pub accuracy: f64,
    /// Confidence (0–100) with complete input and all relevant labs present
    pub base_confidence: f64,
}

impl ModelSpec {
    pub fn new(name: &str, family: ModelFamily, weight: f64, accuracy: f64, base_confidence: f64) -> Self {
        Self { name: name.to_string(), family, weight, accuracy, base_confidence }
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        let ok = self.weight.is_finite()
            && self.weight >= 0.0
            && self.accuracy.is_finite()
            && self.accuracy > 0.0
            && self.accuracy <= 1.0;
        if ok {
            Ok(())
        } else {
            Err(ScoringError::InvalidWeight {
                name: self.name.clone(),
                weight: self.weight,
                accuracy: self.accuracy,
            })
        }
    }
}

/// Output of a model's formula before clamping and classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Percent risk, unclamped
    pub risk: f64,
    /// Multiplier on the model's base confidence, in [0, 1]
    pub evidence: f64,
}

impl Estimate {
    pub fn new(risk: f64) -> Self {
        Self { risk, evidence: 1.0 }
    }

    pub fn with_evidence(mut self, evidence: f64) -> Self {
        self.evidence = evidence.clamp(0.0, 1.0);
        self
    }
}

/// One model's vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub name: String,
    pub family: ModelFamily,
    /// Clamped to [0, 98]
    pub score: f64,
    /// 0–100
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub weight: f64,
    pub accuracy: f64,
}

impl ModelPrediction {
    /// Assemble a prediction, enforcing the score bound and classifying it.
    pub fn from_parts(spec: &ModelSpec, score: f64, confidence: f64, thresholds: &RiskThresholds) -> Self {
        let score = clamp_score(score);
        Self {
            name: spec.name.clone(),
            family: spec.family,
            score,
            confidence: if confidence.is_finite() { confidence.clamp(0.0, 100.0) } else { 0.0 },
            risk_level: thresholds.classify(score),
            weight: spec.weight,
            accuracy: spec.accuracy,
        }
    }
}

/// Synchronous, pure scoring function. Implementations hold no mutable
/// state, so the bank may evaluate them in any order or in parallel.
pub trait Scorer: Send + Sync {
    fn spec(&self) -> &ModelSpec;

    fn estimate(&self, features: &PatientFeatures) -> Estimate;

    fn predict(&self, features: &PatientFeatures, thresholds: &RiskThresholds) -> ModelPrediction {
        let spec = self.spec();
        let estimate = self.estimate(features);
        // Missing core inputs erode confidence by up to 30%
        let completeness = 0.7 + 0.3 * features.completeness;
        let confidence = spec.base_confidence * estimate.evidence * completeness;
        ModelPrediction::from_parts(spec, estimate.risk, confidence, thresholds)
    }
}

/// A named pure function plus its voting constants.
pub struct HeuristicModel {
    spec: ModelSpec,
    formula: fn(&PatientFeatures) -> Estimate,
}

impl HeuristicModel {
    pub fn new(spec: ModelSpec, formula: fn(&PatientFeatures) -> Estimate) -> Self {
        Self { spec, formula }
    }
}

impl Scorer for HeuristicModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn estimate(&self, features: &PatientFeatures) -> Estimate {
        (self.formula)(features)
    }
}

impl std::fmt::Debug for HeuristicModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicModel").field("spec", &self.spec).finish()
    }
}

/// Score reported by an external scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExternalScore {
    pub score: f64,
    pub confidence: f64,
}

/// Asynchronous scorer that depends on I/O. A failure removes only this
/// model from the ensemble; the remaining models are re-weighted.
#[async_trait]
pub trait ExternalScorer: Send + Sync {
    fn spec(&self) -> &ModelSpec;

    async fn score(&self, features: &PatientFeatures) -> Result<ExternalScore, ScoringError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    /// Scorer that always returns the same score.
    #[derive(Debug, Clone)]
    pub struct MockScorer {
        spec: ModelSpec,
        score: f64,
    }

    impl MockScorer {
        pub fn new(name: &str, score: f64) -> Self {
            Self {
                spec: ModelSpec::new(name, ModelFamily::MlAdvanced, 1.0, 1.0, 80.0),
                score,
            }
        }
    }

    impl Scorer for MockScorer {
        fn spec(&self) -> &ModelSpec {
            &self.spec
        }

        fn estimate(&self, _features: &PatientFeatures) -> Estimate {
            Estimate::new(self.score)
        }
    }
}
