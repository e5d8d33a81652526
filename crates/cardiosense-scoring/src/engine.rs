//! Risk engine: feature extraction → model bank → ensemble → classifier →
//! projection, bundled behind one explicitly constructed object.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use cardiosense_common::{CardioConfig, PatientInput};

use crate::bank::ModelBank;
use crate::ensemble::{aggregate, EnsembleConfig, EnsembleResult};
use crate::features::{extract_features, PatientFeatures};
use crate::model::{ExternalScorer, ModelPrediction, ScoringError};
use crate::projection::{TemporalProjection, TemporalProjector};
use crate::weights::{weight_table, WeightEntry};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub features: PatientFeatures,
    pub predictions: Vec<ModelPrediction>,
    pub ensemble: EnsembleResult,
    /// Projection for the patient's own trend flag (stable if unset)
    pub projection: TemporalProjection,
    /// Names of external scorers that failed and were left out
    pub dropped_models: Vec<String>,
    pub elapsed_ms: f64,
}

pub struct RiskEngine {
    bank: ModelBank,
    ensemble: EnsembleConfig,
    projector: TemporalProjector,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(ModelBank::standard(), EnsembleConfig::default(), TemporalProjector::default())
    }
}

impl RiskEngine {
    pub fn new(bank: ModelBank, ensemble: EnsembleConfig, projector: TemporalProjector) -> Self {
        Self { bank, ensemble, projector }
    }

    pub fn from_config(config: &CardioConfig) -> Self {
        let ensemble = EnsembleConfig::from(&config.scoring);
        let projector = TemporalProjector::new(config.projection.clone(), ensemble.thresholds);
        Self::new(ModelBank::standard(), ensemble, projector)
    }

    pub fn bank(&self) -> &ModelBank {
        &self.bank
    }

    pub fn ensemble_config(&self) -> &EnsembleConfig {
        &self.ensemble
    }

    pub fn projector(&self) -> &TemporalProjector {
        &self.projector
    }

    pub fn model_count(&self) -> usize {
        self.bank.len()
    }

    pub fn weight_table(&self) -> Vec<WeightEntry> {
        weight_table(&self.bank.specs())
    }

    /// Score a patient with the synchronous model bank only.
    pub fn assess(&self, input: &PatientInput) -> RiskAssessment {
        let started = Instant::now();
        let features = extract_features(input);
        let predictions = self.bank.predict_all(&features, &self.ensemble.thresholds);
        self.finish(features, predictions, Vec::new(), started)
    }

    /// Score a patient with the model bank plus external scorers. External
    /// scorers run concurrently; any that fail are dropped and the ensemble
    /// re-weights over the rest.
    pub async fn assess_with_external(
        &self,
        input: &PatientInput,
        external: &[Arc<dyn ExternalScorer>],
    ) -> RiskAssessment {
        let started = Instant::now();
        let features = extract_features(input);
        let mut predictions = self.bank.predict_all(&features, &self.ensemble.thresholds);

        let outcomes = join_all(external.iter().map(|scorer| scorer.score(&features))).await;

        let mut dropped = Vec::new();
        for (scorer, outcome) in external.iter().zip(outcomes) {
            let spec = scorer.spec();
            let checked = outcome.and_then(|result| {
                if result.score.is_finite() {
                    Ok(result)
                } else {
                    Err(ScoringError::InvalidScore { name: spec.name.clone(), score: result.score })
                }
            });
            match checked {
                Ok(result) => {
                    predictions.push(ModelPrediction::from_parts(
                        spec,
                        result.score,
                        result.confidence,
                        &self.ensemble.thresholds,
                    ));
                }
                Err(e) => {
                    tracing::warn!(model = %spec.name, error = %e, "external scorer dropped from ensemble");
                    dropped.push(spec.name.clone());
                }
            }
        }

        self.finish(features, predictions, dropped, started)
    }

    fn finish(
        &self,
        features: PatientFeatures,
        predictions: Vec<ModelPrediction>,
        dropped_models: Vec<String>,
        started: Instant,
    ) -> RiskAssessment {
        let ensemble = aggregate(&predictions, features.population, &self.ensemble);
        let projection = self.projector.project(ensemble.final_score, features.age, features.trend);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            score = ensemble.final_score,
            level = %ensemble.risk_level,
            models = ensemble.model_count,
            dropped = dropped_models.len(),
            elapsed_ms,
            "risk assessed"
        );

        RiskAssessment {
            features,
            predictions,
            ensemble,
            projection,
            dropped_models,
            elapsed_ms,
        }
    }
}
