//! Model bank: the registry of scorers the ensemble votes over.
//!
//! Models are added or removed here without touching the aggregator.

pub mod biomarker;
pub mod clinical;
pub mod ml;
pub mod population;

use std::collections::HashSet;

use crate::classifier::RiskThresholds;
use crate::features::PatientFeatures;
use crate::model::{ModelPrediction, ModelSpec, Scorer, ScoringError};
use crate::normalise::standardise;

/// Standardised core measurements shared by the formula-based models.
pub(crate) struct Terms {
    pub age: f64,
    pub systolic: f64,
    pub cholesterol: f64,
    pub hdl: f64,
    pub bmi: f64,
    pub glucose: f64,
}

impl Terms {
    pub fn of(f: &PatientFeatures) -> Self {
        Self {
            age: standardise(f.age, 50.0, 10.0),
            systolic: standardise(f.systolic_bp, 120.0, 20.0),
            cholesterol: standardise(f.total_cholesterol, 200.0, 40.0),
            hdl: standardise(f.hdl_cholesterol, 50.0, 15.0),
            bmi: standardise(f.bmi, 25.0, 5.0),
            glucose: standardise(f.fasting_glucose, 100.0, 25.0),
        }
    }
}

pub(crate) fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

pub struct ModelBank {
    scorers: Vec<Box<dyn Scorer>>,
}

impl ModelBank {
    pub fn empty() -> Self {
        Self { scorers: Vec::new() }
    }

    /// The standard 19-model bank: 5 clinical, 6 ML-style, 4 population,
    /// 4 biomarker.
    pub fn standard() -> Self {
        let mut bank = Self::empty();
        let models = clinical::models()
            .into_iter()
            .chain(ml::models())
            .chain(population::models())
            .chain(biomarker::models());
        for model in models {
            bank.scorers.push(Box::new(model));
        }
        bank
    }

    /// Register a scorer. Rejects invalid weights and duplicate names.
    pub fn register(&mut self, scorer: Box<dyn Scorer>) -> Result<(), ScoringError> {
        let spec = scorer.spec();
        spec.validate()?;
        if self.scorers.iter().any(|s| s.spec().name == spec.name) {
            return Err(ScoringError::DuplicateModel(spec.name.clone()));
        }
        self.scorers.push(scorer);
        Ok(())
    }

    pub fn with(mut self, scorer: impl Scorer + 'static) -> Result<Self, ScoringError> {
        self.register(Box::new(scorer))?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }

    pub fn specs(&self) -> Vec<&ModelSpec> {
        self.scorers.iter().map(|s| s.spec()).collect()
    }

    /// Evaluate every model. Order follows registration order.
    pub fn predict_all(&self, features: &PatientFeatures, thresholds: &RiskThresholds) -> Vec<ModelPrediction> {
        self.scorers
            .iter()
            .map(|s| s.predict(features, thresholds))
            .collect()
    }

    /// Validate every registered spec and check names are unique.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let mut seen = HashSet::new();
        for spec in self.specs() {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ScoringError::DuplicateModel(spec.name.clone()));
            }
        }
        Ok(())
    }
}

impl Default for ModelBank {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::extract_features;
    use crate::model::mock::MockScorer;
    use crate::model::ModelFamily;
    use cardiosense_common::PatientInput;

    #[test]
    fn test_standard_bank_has_nineteen_models() {
        let bank = ModelBank::standard();
        assert_eq!(bank.len(), 19);
        assert!(bank.validate().is_ok());

        let count = |family: ModelFamily| bank.specs().iter().filter(|s| s.family == family).count();
        assert_eq!(count(ModelFamily::ClinicalValidated), 5);
        assert_eq!(count(ModelFamily::MlAdvanced), 6);
        assert_eq!(count(ModelFamily::PopulationSpecific), 4);
        assert_eq!(count(ModelFamily::BiomarkerEnhanced), 4);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut bank = ModelBank::empty();
        assert!(bank.register(Box::new(MockScorer::new("a", 10.0))).is_ok());
        assert!(bank.register(Box::new(MockScorer::new("a", 20.0))).is_err());
        assert_eq!(bank.len(), 1);
    }

    #[test]
    fn test_predictions_in_bounds_and_ordered() {
        let bank = ModelBank::standard();
        let f = extract_features(&PatientInput {
            age: Some(90.0),
            systolic_bp: Some(250.0),
            total_cholesterol: Some(450.0),
            hdl_cholesterol: Some(20.0),
            smoker: Some(true),
            diabetes: Some(true),
            family_history: Some(true),
            ..Default::default()
        });
        let preds = bank.predict_all(&f, &RiskThresholds::default());
        assert_eq!(preds.len(), 19);
        assert_eq!(preds[0].name, "framingham");
        for p in &preds {
            assert!(p.score >= 0.0 && p.score <= 98.0, "{} out of range: {}", p.name, p.score);
            assert!(p.confidence >= 0.0 && p.confidence <= 100.0);
        }
    }
}
