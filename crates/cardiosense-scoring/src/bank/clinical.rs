//! "Clinical-validated" family: closed-form log-odds equations that loosely
//! follow the shape of published risk scores. Coefficients are illustrative.

use cardiosense_common::{ActivityLevel, PopulationGroup};

use crate::features::PatientFeatures;
use crate::model::{Estimate, HeuristicModel, ModelFamily, ModelSpec};
use crate::normalise::{logistic_percent, standardise};

use super::{flag, Terms};

pub(crate) fn models() -> Vec<HeuristicModel> {
    let family = ModelFamily::ClinicalValidated;
    vec![
        HeuristicModel::new(ModelSpec::new("framingham", family, 1.0, 0.82, 85.0), framingham),
        HeuristicModel::new(ModelSpec::new("pooled_cohort", family, 1.0, 0.84, 86.0), pooled_cohort),
        HeuristicModel::new(ModelSpec::new("score_europe", family, 1.0, 0.80, 82.0), score_europe),
        HeuristicModel::new(ModelSpec::new("qrisk", family, 1.0, 0.83, 84.0), qrisk),
        HeuristicModel::new(ModelSpec::new("reynolds", family, 1.0, 0.81, 82.0), reynolds),
    ]
}

pub(crate) fn framingham_percent(f: &PatientFeatures) -> f64 {
    let t = Terms::of(f);
    logistic_percent(
        -2.3 + 0.65 * t.age + 0.45 * t.systolic + 0.30 * t.cholesterol - 0.35 * t.hdl
            + 0.65 * flag(f.smoker)
            + 0.60 * flag(f.diabetes)
            + 0.30 * flag(f.family_history)
            + 0.20 * flag(f.gender.is_male())
            + 0.15 * flag(f.treated_hypertension),
    )
}

pub(crate) fn pooled_cohort_percent(f: &PatientFeatures) -> f64 {
    let t = Terms::of(f);
    logistic_percent(
        -2.5 + 0.70 * t.age + 0.50 * t.systolic + 0.20 * t.cholesterol - 0.30 * t.hdl
            + 0.55 * flag(f.smoker)
            + 0.70 * flag(f.diabetes)
            + 0.15 * flag(f.gender.is_male())
            + 0.20 * flag(f.treated_hypertension),
    )
}

/// Shared base for the population and biomarker families: the mean of the
/// two broadest clinical equations.
pub(crate) fn clinical_base(f: &PatientFeatures) -> f64 {
    (framingham_percent(f) + pooled_cohort_percent(f)) / 2.0
}

fn framingham(f: &PatientFeatures) -> Estimate {
    Estimate::new(framingham_percent(f))
}

fn pooled_cohort(f: &PatientFeatures) -> Estimate {
    Estimate::new(pooled_cohort_percent(f))
}

/// Age and sex dominate; diabetes is a minor term.
fn score_europe(f: &PatientFeatures) -> Estimate {
    let t = Terms::of(f);
    Estimate::new(logistic_percent(
        -2.8 + 0.75 * t.age + 0.40 * t.systolic + 0.35 * t.cholesterol
            + 0.60 * flag(f.smoker)
            + 0.30 * flag(f.diabetes)
            + 0.40 * flag(f.gender.is_male()),
    ))
}

/// Uses the TC/HDL ratio, BMI, ethnicity and activity.
fn qrisk(f: &PatientFeatures) -> Estimate {
    let t = Terms::of(f);
    let ratio = standardise(f.total_hdl_ratio, 4.0, 1.5);
    let bmi = standardise(f.bmi, 25.0, 5.0);
    Estimate::new(logistic_percent(
        -2.4 + 0.60 * t.age + 0.35 * t.systolic + 0.25 * ratio + 0.25 * bmi
            + 0.55 * flag(f.smoker)
            + 0.65 * flag(f.diabetes)
            + 0.45 * flag(f.family_history)
            + 0.15 * flag(f.gender.is_male())
            + 0.30 * flag(f.population == PopulationGroup::SouthAsian)
            + 0.10 * flag(f.activity_level == ActivityLevel::Sedentary),
    ))
}

/// Adds an hs-CRP term when the lab is available.
fn reynolds(f: &PatientFeatures) -> Estimate {
    let t = Terms::of(f);
    let crp_term = f.hs_crp.map(|crp| 0.25 * crp.max(0.1).ln()).unwrap_or(0.0);
    let estimate = Estimate::new(logistic_percent(
        -2.6 + 0.65 * t.age + 0.45 * t.systolic + 0.30 * t.cholesterol - 0.30 * t.hdl
            + 0.55 * flag(f.smoker)
            + 0.55 * flag(f.diabetes)
            + 0.35 * flag(f.family_history)
            + crp_term,
    ));
    if f.hs_crp.is_some() { estimate } else { estimate.with_evidence(0.85) }
}
