//! Test fixtures: named scenario patients and a seeded synthetic cohort.
//!
//! The cohort is random but reproducible. It is not clinical data and has
//! no invariant beyond "the requested number of records, every value inside
//! its declared range".

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cardiosense_common::{ActivityLevel, Gender, PatientInput, PopulationGroup, RiskTrend};

/// Declared sampling ranges, inclusive.
pub mod ranges {
    pub const AGE: (f64, f64) = (29.0, 77.0);
    pub const SYSTOLIC_BP: (f64, f64) = (94.0, 200.0);
    pub const DIASTOLIC_BP: (f64, f64) = (60.0, 110.0);
    pub const TOTAL_CHOLESTEROL: (f64, f64) = (126.0, 400.0);
    pub const HDL: (f64, f64) = (25.0, 90.0);
    pub const TRIGLYCERIDES: (f64, f64) = (50.0, 400.0);
    pub const FASTING_GLUCOSE: (f64, f64) = (70.0, 200.0);
    pub const BMI: (f64, f64) = (17.0, 42.0);
    pub const HS_CRP: (f64, f64) = (0.2, 15.0);
    pub const LIPOPROTEIN_A: (f64, f64) = (5.0, 150.0);
    pub const HBA1C: (f64, f64) = (4.5, 10.0);
    pub const CREATININE: (f64, f64) = (0.5, 3.0);
}

/// Age 65, systolic 170, cholesterol 280, smoker, diabetic.
pub fn high_risk_patient() -> PatientInput {
    PatientInput {
        age: Some(65.0),
        systolic_bp: Some(170.0),
        total_cholesterol: Some(280.0),
        smoker: Some(true),
        diabetes: Some(true),
        ..Default::default()
    }
}

/// Age 30, systolic 110, cholesterol 160, non-smoker, not diabetic.
pub fn low_risk_patient() -> PatientInput {
    PatientInput {
        age: Some(30.0),
        systolic_bp: Some(110.0),
        total_cholesterol: Some(160.0),
        smoker: Some(false),
        diabetes: Some(false),
        ..Default::default()
    }
}

/// JSON body for a patient, as the HTTP API receives it.
pub fn patient_json(patient: &PatientInput) -> serde_json::Value {
    serde_json::to_value(patient).unwrap_or(serde_json::Value::Null)
}

/// Seeded generator of synthetic patients.
pub struct CohortGenerator {
    rng: StdRng,
}

impl CohortGenerator {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn patient(&mut self) -> PatientInput {
        let age = self.sample(ranges::AGE);
        PatientInput {
            age: Some(age),
            gender: Some(if self.rng.gen_bool(0.68) { Gender::Male } else { Gender::Female }),
            systolic_bp: Some(self.sample(ranges::SYSTOLIC_BP)),
            diastolic_bp: Some(self.sample(ranges::DIASTOLIC_BP)),
            total_cholesterol: Some(self.sample(ranges::TOTAL_CHOLESTEROL)),
            hdl_cholesterol: Some(self.sample(ranges::HDL)),
            ldl_cholesterol: None,
            triglycerides: Some(self.sample(ranges::TRIGLYCERIDES)),
            fasting_glucose: Some(self.sample(ranges::FASTING_GLUCOSE)),
            bmi: Some(self.sample(ranges::BMI)),
            smoker: Some(self.rng.gen_bool(0.2)),
            diabetes: Some(self.rng.gen_bool(0.15)),
            family_history: Some(self.rng.gen_bool(0.3)),
            treated_hypertension: Some(self.rng.gen_bool(0.2)),
            activity_level: Some(self.pick(&[ActivityLevel::Sedentary, ActivityLevel::Moderate, ActivityLevel::Active])),
            population: Some(self.pick(&[
                PopulationGroup::General,
                PopulationGroup::SouthAsian,
                PopulationGroup::EastAsian,
                PopulationGroup::African,
                PopulationGroup::Hispanic,
                PopulationGroup::European,
            ])),
            // Auxiliary labs are present for roughly half the cohort
            hs_crp: self.maybe(ranges::HS_CRP),
            lipoprotein_a: self.maybe(ranges::LIPOPROTEIN_A),
            hba1c: self.maybe(ranges::HBA1C),
            creatinine: self.maybe(ranges::CREATININE),
            trend: Some(self.pick(&RiskTrend::ALL)),
        }
    }

    pub fn cohort(&mut self, count: usize) -> Vec<PatientInput> {
        (0..count).map(|_| self.patient()).collect()
    }

    fn sample(&mut self, (min, max): (f64, f64)) -> f64 {
        let v: f64 = self.rng.gen_range(min..=max);
        (v * 10.0).round() / 10.0
    }

    fn maybe(&mut self, range: (f64, f64)) -> Option<f64> {
        if self.rng.gen_bool(0.5) { Some(self.sample(range)) } else { None }
    }

    fn pick<T: Copy>(&mut self, options: &[T]) -> T {
        options[self.rng.gen_range(0..options.len())]
    }
}

/// `count` synthetic patients from a fixed seed.
pub fn synthetic_cohort(count: usize, seed: u64) -> Vec<PatientInput> {
    CohortGenerator::new(seed).cohort(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn within(value: Option<f64>, (min, max): (f64, f64)) -> bool {
        value.map_or(true, |v| v >= min && v <= max)
    }

    #[test]
    fn test_generates_requested_count() {
        assert_eq!(synthetic_cohort(0, 1).len(), 0);
        assert_eq!(synthetic_cohort(250, 1).len(), 250);
    }

    #[test]
    fn test_values_within_declared_ranges() {
        for p in synthetic_cohort(500, 42) {
            assert!(within(p.age, ranges::AGE));
            assert!(within(p.systolic_bp, ranges::SYSTOLIC_BP));
            assert!(within(p.diastolic_bp, ranges::DIASTOLIC_BP));
            assert!(within(p.total_cholesterol, ranges::TOTAL_CHOLESTEROL));
            assert!(within(p.hdl_cholesterol, ranges::HDL));
            assert!(within(p.triglycerides, ranges::TRIGLYCERIDES));
            assert!(within(p.fasting_glucose, ranges::FASTING_GLUCOSE));
            assert!(within(p.bmi, ranges::BMI));
            assert!(within(p.hs_crp, ranges::HS_CRP));
            assert!(within(p.lipoprotein_a, ranges::LIPOPROTEIN_A));
            assert!(within(p.hba1c, ranges::HBA1C));
            assert!(within(p.creatinine, ranges::CREATININE));
        }
    }

    #[test]
    fn test_same_seed_same_cohort() {
        assert_eq!(synthetic_cohort(20, 7), synthetic_cohort(20, 7));
    }

    #[test]
    fn test_scenario_json_is_camel_case() {
        let json = patient_json(&high_risk_patient());
        assert_eq!(json["systolicBp"], 170.0);
        assert_eq!(json["totalCholesterol"], 280.0);
    }
}
