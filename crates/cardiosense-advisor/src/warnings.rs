//! Rule-based safety warnings.
//!
//! These are computed from the assessment on every path, LLM or fallback,
//! so an elevated risk always carries a prompt to see a clinician.

use cardiosense_common::RiskLevel;
use cardiosense_scoring::{EnsembleResult, PatientFeatures};

pub const DISCLAIMER: &str = "This information is for education only and is not medical advice. \
The risk estimate comes from heuristic formulas, not a validated clinical model. \
Always consult a qualified doctor before starting, stopping or changing any medicine, \
herbal remedy, exercise or diet.";

/// Extra warnings taken from a provider response, on top of the rules.
pub const MAX_PROVIDER_WARNINGS: usize = 2;

pub fn risk_warnings(features: &PatientFeatures, ensemble: &EnsembleResult) -> Vec<String> {
    let mut warnings = Vec::new();

    if ensemble.degraded {
        warnings.push(
            "Your risk could not be estimated reliably. Please consult a medical professional for a full assessment."
                .to_string(),
        );
    } else {
        match ensemble.risk_level {
            RiskLevel::VeryHigh => warnings.push(format!(
                "Your estimated cardiovascular risk is very high ({:.0}%). Consult a doctor or cardiologist as soon as possible.",
                ensemble.final_score
            )),
            RiskLevel::High => warnings.push(format!(
                "Your estimated cardiovascular risk is high ({:.0}%). Consult your doctor for a medical review.",
                ensemble.final_score
            )),
            RiskLevel::Medium | RiskLevel::Low => {}
        }
    }

    if features.systolic_bp >= 180.0 {
        warnings.push(
            "Systolic blood pressure at or above 180 mmHg is in the crisis range. Seek medical attention promptly."
                .to_string(),
        );
    } else if features.systolic_bp >= 140.0 {
        warnings.push("Your blood pressure is elevated. Have it checked by a doctor.".to_string());
    }

    if features.smoker {
        warnings.push(
            "Smoking sharply raises heart and stroke risk. Ask your doctor about support to quit.".to_string(),
        );
    }
    if features.diabetes {
        warnings.push("Diabetes multiplies cardiovascular risk. Keep regular medical follow-up of blood sugar.".to_string());
    }
    if features.cholesterol_risk {
        warnings.push("Total cholesterol is above 240 mg/dL. Discuss a full lipid panel with your doctor.".to_string());
    }
    if features.bmi >= 35.0 {
        warnings.push("A BMI of 35 or more adds substantial risk. Seek medical guidance on weight management.".to_string());
    }

    warnings
}

/// Rule warnings first, then up to `MAX_PROVIDER_WARNINGS` provider
/// warnings that are not already present (case-insensitive).
pub fn merge_warnings(rules: Vec<String>, provider: Vec<String>) -> Vec<String> {
    let mut merged = rules;
    let mut added = 0;
    for w in provider {
        if added == MAX_PROVIDER_WARNINGS {
            break;
        }
        let lower = w.to_lowercase();
        if w.trim().is_empty() || merged.iter().any(|m| m.to_lowercase() == lower) {
            continue;
        }
        merged.push(w);
        added += 1;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardiosense_scoring::RiskEngine;
    use cardiosense_test_utils::{high_risk_patient, low_risk_patient};

    fn mentions_clinician(warnings: &[String]) -> bool {
        warnings.iter().any(|w| {
            let w = w.to_lowercase();
            w.contains("consult") || w.contains("doctor") || w.contains("medical")
        })
    }

    #[test]
    fn test_high_risk_warns_to_consult() {
        let a = RiskEngine::default().assess(&high_risk_patient());
        let warnings = risk_warnings(&a.features, &a.ensemble);
        assert!(!warnings.is_empty());
        assert!(mentions_clinician(&warnings));
    }

    #[test]
    fn test_low_risk_has_few_warnings() {
        let a = RiskEngine::default().assess(&low_risk_patient());
        assert!(risk_warnings(&a.features, &a.ensemble).len() < 3);
    }

    #[test]
    fn test_degraded_result_still_urges_consultation() {
        let engine = RiskEngine::new(
            cardiosense_scoring::ModelBank::empty(),
            Default::default(),
            Default::default(),
        );
        let a = engine.assess(&low_risk_patient());
        assert!(a.ensemble.degraded);
        assert!(mentions_clinician(&risk_warnings(&a.features, &a.ensemble)));
    }

    #[test]
    fn test_merge_dedups_and_caps() {
        let merged = merge_warnings(
            vec!["See a doctor.".into()],
            vec!["see a doctor.".into(), "A".into(), "".into(), "B".into(), "C".into()],
        );
        assert_eq!(merged, vec!["See a doctor.", "A", "B"]);
    }
}
