use std::sync::Arc;

use cardiosense_common::{PatientInput, PopulationGroup, RiskLevel};
use async_trait::async_trait;
use cardiosense_scoring::{
    ExternalScore, ExternalScorer, ModelBank, ModelFamily, ModelSpec, PatientFeatures, RiskEngine, ScoringError,
};
use cardiosense_test_utils::{high_risk_patient, low_risk_patient, synthetic_cohort};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn test_high_risk_scenario() {
    let engine = RiskEngine::default();
    let assessment = engine.assess(&high_risk_patient());
    assert!(
        matches!(assessment.ensemble.risk_level, RiskLevel::High | RiskLevel::VeryHigh),
        "got {:?} at {}",
        assessment.ensemble.risk_level,
        assessment.ensemble.final_score
    );
    assert_eq!(assessment.predictions.len(), 19);
    assert!(!assessment.ensemble.degraded);
}

#[test]
fn test_low_risk_scenario() {
    let engine = RiskEngine::default();
    let assessment = engine.assess(&low_risk_patient());
    assert_eq!(assessment.ensemble.risk_level, RiskLevel::Low, "score {}", assessment.ensemble.final_score);
    assert!(!assessment.ensemble.disagreement_penalty_applied);
}

#[test]
fn test_predictions_are_deterministic() {
    let engine = RiskEngine::default();
    let patient = high_risk_patient();
    let first = engine.assess(&patient);
    let second = engine.assess(&patient);
    assert_eq!(first.predictions, second.predictions);
    assert_eq!(first.ensemble, second.ensemble);
}

#[test]
fn test_population_calibration_raises_south_asian_score() {
    let engine = RiskEngine::default();
    let general = engine.assess(&PatientInput { age: Some(55.0), ..Default::default() });
    let south_asian = engine.assess(&PatientInput {
        age: Some(55.0),
        population: Some(PopulationGroup::SouthAsian),
        ..Default::default()
    });
    assert!(south_asian.ensemble.final_score > general.ensemble.final_score);
    assert_eq!(south_asian.ensemble.calibration_factor, 1.15);
}

#[test]
fn test_empty_bank_returns_safe_default() {
    let engine = RiskEngine::new(ModelBank::empty(), Default::default(), Default::default());
    let assessment = engine.assess(&high_risk_patient());
    assert!(assessment.ensemble.degraded);
    assert_eq!(assessment.ensemble.final_score, 50.0);
    assert_eq!(assessment.ensemble.model_agreement, 0.0);
}

#[test]
fn test_cohort_scores_bounded_and_weighted_within_range() {
    let engine = RiskEngine::default();
    for patient in synthetic_cohort(300, 2024) {
        let a = engine.assess(&patient);
        let e = &a.ensemble;
        assert!(e.final_score >= 0.0 && e.final_score <= 100.0);

        let min = a.predictions.iter().map(|p| p.score).fold(f64::INFINITY, f64::min);
        let max = a.predictions.iter().map(|p| p.score).fold(f64::NEG_INFINITY, f64::max);
        assert!(e.weighted_score >= min - 1e-9 && e.weighted_score <= max + 1e-9);
        assert!(a.predictions.iter().all(|p| p.score >= 0.0 && p.score <= 98.0));
    }
}

/// External scorer with a fixed outcome.
struct FixedExternalScorer {
    spec: ModelSpec,
    score: Option<f64>,
}

impl FixedExternalScorer {
    fn succeeding(name: &str, score: f64) -> Self {
        Self { spec: ModelSpec::new(name, ModelFamily::MlAdvanced, 1.0, 1.0, 80.0), score: Some(score) }
    }

    fn failing(name: &str) -> Self {
        Self { spec: ModelSpec::new(name, ModelFamily::MlAdvanced, 1.0, 1.0, 80.0), score: None }
    }
}

#[async_trait]
impl ExternalScorer for FixedExternalScorer {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    async fn score(&self, _features: &PatientFeatures) -> Result<ExternalScore, ScoringError> {
        match self.score {
            Some(score) => Ok(ExternalScore { score, confidence: 80.0 }),
            None => Err(ScoringError::External { name: self.spec.name.clone(), reason: "unavailable".into() }),
        }
    }
}

#[tokio::test]
async fn test_failing_external_scorer_is_dropped() {
    let engine = RiskEngine::default();
    let external: Vec<Arc<dyn ExternalScorer>> = vec![
        Arc::new(FixedExternalScorer::failing("ai_model")),
        Arc::new(FixedExternalScorer::succeeding("ai_model_backup", 40.0)),
    ];
    let assessment = engine.assess_with_external(&high_risk_patient(), &external).await;
    assert_eq!(assessment.predictions.len(), 20);
    assert_eq!(assessment.dropped_models, vec!["ai_model".to_string()]);
    assert!(assessment.predictions.iter().any(|p| p.name == "ai_model_backup"));
}

#[tokio::test]
async fn test_all_external_failures_match_sync_assessment() {
    let engine = RiskEngine::default();
    let external: Vec<Arc<dyn ExternalScorer>> = vec![Arc::new(FixedExternalScorer::failing("ai_model"))];
    let with_external = engine.assess_with_external(&low_risk_patient(), &external).await;
    let sync_only = engine.assess(&low_risk_patient());
    assert_eq!(with_external.ensemble, sync_only.ensemble);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_final_score_bounded_for_any_input(
        age in proptest::option::of(-50.0f64..200.0),
        sbp in proptest::option::of(0.0f64..400.0),
        tc in proptest::option::of(0.0f64..900.0),
        hdl in proptest::option::of(0.0f64..200.0),
        smoker in proptest::option::of(any::<bool>()),
        diabetes in proptest::option::of(any::<bool>()),
    ) {
        let engine = RiskEngine::default();
        let input = PatientInput {
            age,
            systolic_bp: sbp,
            total_cholesterol: tc,
            hdl_cholesterol: hdl,
            smoker,
            diabetes,
            ..Default::default()
        };
        let a = engine.assess(&input);
        prop_assert!(a.ensemble.final_score >= 0.0 && a.ensemble.final_score <= 100.0);
    }
}
