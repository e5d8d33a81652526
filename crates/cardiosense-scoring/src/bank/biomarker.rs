//! "Biomarker-enhanced" family: the clinical base scaled by a multiplier
//! keyed on one auxiliary lab value. Without the lab the multiplier is 1.0
//! and confidence drops.

use crate::features::PatientFeatures;
use crate::model::{Estimate, HeuristicModel, ModelFamily, ModelSpec};

use super::clinical::clinical_base;

const MISSING_LAB_EVIDENCE: f64 = 0.65;

pub(crate) fn models() -> Vec<HeuristicModel> {
    let family = ModelFamily::BiomarkerEnhanced;
    vec![
        HeuristicModel::new(ModelSpec::new("hs_crp", family, 0.8, 0.80, 82.0), hs_crp),
        HeuristicModel::new(ModelSpec::new("lipoprotein_a", family, 0.8, 0.80, 82.0), lipoprotein_a),
        HeuristicModel::new(ModelSpec::new("hba1c", family, 0.8, 0.80, 82.0), hba1c),
        HeuristicModel::new(ModelSpec::new("renal", family, 0.8, 0.80, 80.0), renal),
    ]
}

fn scaled(f: &PatientFeatures, multiplier: Option<f64>) -> Estimate {
    let base = clinical_base(f);
    match multiplier {
        Some(m) => Estimate::new(base * m),
        None => Estimate::new(base).with_evidence(MISSING_LAB_EVIDENCE),
    }
}

/// mg/L. Very high values usually mean acute inflammation, so the
/// multiplier backs off above 10.
fn hs_crp(f: &PatientFeatures) -> Estimate {
    let m = f.hs_crp.map(|crp| match crp {
        c if c < 1.0 => 0.90,
        c if c < 3.0 => 1.00,
        c if c <= 10.0 => 1.30,
        _ => 1.15,
    });
    scaled(f, m)
}

/// mg/dL
fn lipoprotein_a(f: &PatientFeatures) -> Estimate {
    let m = f.lipoprotein_a.map(|lpa| match lpa {
        l if l < 30.0 => 1.00,
        l if l < 50.0 => 1.15,
        _ => 1.40,
    });
    scaled(f, m)
}

/// Percent. 5.7 and 6.5 are the prediabetes / diabetes cut-points.
fn hba1c(f: &PatientFeatures) -> Estimate {
    let m = f.hba1c.map(|a1c| match a1c {
        a if a < 5.7 => 1.00,
        a if a < 6.5 => 1.20,
        _ => 1.50,
    });
    scaled(f, m)
}

/// MDRD-style eGFR from creatinine (mg/dL), bucketed by CKD stage.
fn renal(f: &PatientFeatures) -> Estimate {
    let m = f.creatinine.map(|cr| {
        let sex = if f.gender.is_male() { 1.0 } else { 0.742 };
        let egfr = 186.0 * cr.powf(-1.154) * f.age.powf(-0.203) * sex;
        match egfr {
            e if e >= 90.0 => 1.00,
            e if e >= 60.0 => 1.10,
            e if e >= 30.0 => 1.40,
            _ => 1.80,
        }
    });
    scaled(f, m)
}
