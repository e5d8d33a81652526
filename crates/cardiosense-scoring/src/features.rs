//! Feature extraction: raw patient input → complete, bounded feature vector.
//!
//! Missing fields are never an error. Each one is replaced by a population
//! default, and out-of-range values are clamped to physiological bounds so
//! that a typo ("1700" for systolic BP) cannot push a model off its scale.

use serde::{Deserialize, Serialize};

use cardiosense_common::entities::{ActivityLevel, Gender, PatientInput, PopulationGroup, RiskTrend};

// Defaults substituted for missing values.
pub const DEFAULT_AGE: f64 = 45.0;
pub const DEFAULT_SYSTOLIC_BP: f64 = 120.0;
pub const DEFAULT_DIASTOLIC_BP: f64 = 80.0;
pub const DEFAULT_TOTAL_CHOLESTEROL: f64 = 200.0;
pub const DEFAULT_HDL: f64 = 50.0;
pub const DEFAULT_TRIGLYCERIDES: f64 = 130.0;
pub const DEFAULT_FASTING_GLUCOSE: f64 = 95.0;
pub const DEFAULT_BMI: f64 = 25.0;

/// Inclusive `[min, max]` bounds per measurement.
mod bounds {
    pub const AGE: (f64, f64) = (18.0, 100.0);
    pub const SYSTOLIC: (f64, f64) = (70.0, 260.0);
    pub const DIASTOLIC: (f64, f64) = (40.0, 160.0);
    pub const TOTAL_CHOLESTEROL: (f64, f64) = (80.0, 500.0);
    pub const HDL: (f64, f64) = (15.0, 120.0);
    pub const LDL: (f64, f64) = (20.0, 400.0);
    pub const TRIGLYCERIDES: (f64, f64) = (30.0, 1500.0);
    pub const GLUCOSE: (f64, f64) = (50.0, 500.0);
    pub const BMI: (f64, f64) = (12.0, 70.0);
    pub const HS_CRP: (f64, f64) = (0.0, 50.0);
    pub const LP_A: (f64, f64) = (0.0, 400.0);
    pub const HBA1C: (f64, f64) = (3.0, 20.0);
    pub const CREATININE: (f64, f64) = (0.2, 15.0);
}

/// Complete feature vector consumed by every scorer.
/// Created once per assessment and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientFeatures {
    pub age: f64,
    pub gender: Gender,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub total_cholesterol: f64,
    pub hdl_cholesterol: f64,
    pub ldl_cholesterol: f64,
    pub triglycerides: f64,
    pub fasting_glucose: f64,
    pub bmi: f64,
    pub smoker: bool,
    pub diabetes: bool,
    pub family_history: bool,
    pub treated_hypertension: bool,
    pub activity_level: ActivityLevel,
    pub population: PopulationGroup,
    pub trend: RiskTrend,

    // Auxiliary labs stay optional: biomarker models lower their confidence
    // when the lab they key on is absent.
    pub hs_crp: Option<f64>,
    pub lipoprotein_a: Option<f64>,
    pub hba1c: Option<f64>,
    pub creatinine: Option<f64>,

    // Derived interaction terms
    /// age × total cholesterol / 1000
    pub age_cholesterol: f64,
    pub total_hdl_ratio: f64,
    pub ldl_hdl_ratio: f64,
    pub pulse_pressure: f64,
    pub mean_arterial_pressure: f64,
    /// 0: <40, 1: 40–49, 2: 50–59, 3: 60–69, 4: 70+
    pub age_group: u8,
    /// Total cholesterol above 240 mg/dL
    pub cholesterol_risk: bool,
    /// Systolic BP above 140 mmHg
    pub bp_risk: bool,
    pub composite_risk: f64,
    /// Age for male patients, 0 otherwise
    pub sex_age_interaction: f64,
    /// Count of metabolic-syndrome style criteria met (0–5)
    pub metabolic_risk_count: u8,

    /// Fraction of the six core fields (age, systolic BP, total cholesterol,
    /// HDL, smoking, diabetes) the patient actually supplied.
    pub completeness: f64,
}

/// Build the feature vector for one patient. Pure; never fails.
pub fn extract_features(input: &PatientInput) -> PatientFeatures {
    let age = bounded(input.age, DEFAULT_AGE, bounds::AGE);
    let systolic_bp = bounded(input.systolic_bp, DEFAULT_SYSTOLIC_BP, bounds::SYSTOLIC);
    let diastolic_bp = bounded(input.diastolic_bp, DEFAULT_DIASTOLIC_BP, bounds::DIASTOLIC)
        .min(systolic_bp - 10.0)
        .max(bounds::DIASTOLIC.0);
    let total_cholesterol = bounded(
        input.total_cholesterol,
        DEFAULT_TOTAL_CHOLESTEROL,
        bounds::TOTAL_CHOLESTEROL,
    );
    let hdl_cholesterol = bounded(input.hdl_cholesterol, DEFAULT_HDL, bounds::HDL);
    let triglycerides = bounded(input.triglycerides, DEFAULT_TRIGLYCERIDES, bounds::TRIGLYCERIDES);

    // Friedewald estimate when LDL was not measured
    let friedewald = total_cholesterol - hdl_cholesterol - triglycerides / 5.0;
    let ldl_cholesterol = bounded(input.ldl_cholesterol, friedewald, bounds::LDL);

    let fasting_glucose = bounded(input.fasting_glucose, DEFAULT_FASTING_GLUCOSE, bounds::GLUCOSE);
    let bmi = bounded(input.bmi, DEFAULT_BMI, bounds::BMI);

    let gender = input.gender.unwrap_or_default();
    let smoker = input.smoker.unwrap_or(false);
    let diabetes = input.diabetes.unwrap_or(false);

    let supplied = [
        input.age.is_some(),
        input.systolic_bp.is_some(),
        input.total_cholesterol.is_some(),
        input.hdl_cholesterol.is_some(),
        input.smoker.is_some(),
        input.diabetes.is_some(),
    ];
    let completeness = supplied.iter().filter(|s| **s).count() as f64 / supplied.len() as f64;

    let hdl_floor = if gender.is_male() { 40.0 } else { 50.0 };
    let metabolic_risk_count = [
        diabetes || fasting_glucose >= 126.0,
        bmi >= 30.0,
        triglycerides >= 150.0,
        hdl_cholesterol < hdl_floor,
        systolic_bp >= 130.0,
    ]
    .iter()
    .filter(|c| **c)
    .count() as u8;

    PatientFeatures {
        age,
        gender,
        systolic_bp,
        diastolic_bp,
        total_cholesterol,
        hdl_cholesterol,
        ldl_cholesterol,
        triglycerides,
        fasting_glucose,
        bmi,
        smoker,
        diabetes,
        family_history: input.family_history.unwrap_or(false),
        treated_hypertension: input.treated_hypertension.unwrap_or(false),
        activity_level: input.activity_level.unwrap_or_default(),
        population: input.population.unwrap_or_default(),
        trend: input.trend.unwrap_or_default(),
        hs_crp: optional_lab(input.hs_crp, bounds::HS_CRP),
        lipoprotein_a: optional_lab(input.lipoprotein_a, bounds::LP_A),
        hba1c: optional_lab(input.hba1c, bounds::HBA1C),
        creatinine: optional_lab(input.creatinine, bounds::CREATININE),
        age_cholesterol: age * total_cholesterol / 1000.0,
        total_hdl_ratio: total_cholesterol / hdl_cholesterol,
        ldl_hdl_ratio: ldl_cholesterol / hdl_cholesterol,
        pulse_pressure: systolic_bp - diastolic_bp,
        mean_arterial_pressure: diastolic_bp + (systolic_bp - diastolic_bp) / 3.0,
        age_group: age_group(age),
        cholesterol_risk: total_cholesterol > 240.0,
        bp_risk: systolic_bp > 140.0,
        composite_risk: (age / 100.0) * 0.3
            + (systolic_bp / 200.0) * 0.3
            + (total_cholesterol / 300.0) * 0.4,
        sex_age_interaction: if gender.is_male() { age } else { 0.0 },
        metabolic_risk_count,
        completeness,
    }
}

/// Use the supplied value when it is a finite number, otherwise the default;
/// either way clamp to `[min, max]`.
fn bounded(value: Option<f64>, default: f64, (min, max): (f64, f64)) -> f64 {
    value
        .filter(|v| v.is_finite())
        .unwrap_or(default)
        .clamp(min, max)
}

fn optional_lab(value: Option<f64>, (min, max): (f64, f64)) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.clamp(min, max))
}

fn age_group(age: f64) -> u8 {
    match age {
        a if a < 40.0 => 0,
        a if a < 50.0 => 1,
        a if a < 60.0 => 2,
        a if a < 70.0 => 3,
        _ => 4,
    }
}
