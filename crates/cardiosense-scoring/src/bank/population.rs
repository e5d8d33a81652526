//! "Population-specific" family: fixed multiplicative adjustments on the
//! shared clinical base. Each model only applies its adjustment when the
//! patient belongs to its group; otherwise it reports the unadjusted base
//! with reduced confidence.

use cardiosense_common::PopulationGroup;

use crate::features::PatientFeatures;
use crate::model::{Estimate, HeuristicModel, ModelFamily, ModelSpec};

use super::clinical::clinical_base;

pub(crate) fn models() -> Vec<HeuristicModel> {
    let family = ModelFamily::PopulationSpecific;
    vec![
        HeuristicModel::new(ModelSpec::new("south_asian", family, 0.7, 0.78, 80.0), south_asian),
        HeuristicModel::new(ModelSpec::new("east_asian", family, 0.7, 0.78, 80.0), east_asian),
        HeuristicModel::new(ModelSpec::new("african", family, 0.7, 0.78, 80.0), african),
        HeuristicModel::new(ModelSpec::new("hispanic", family, 0.7, 0.78, 80.0), hispanic),
    ]
}

fn adjusted(f: &PatientFeatures, group: PopulationGroup, multiplier: f64) -> Estimate {
    let base = clinical_base(f);
    if f.population == group {
        Estimate::new(base * multiplier)
    } else {
        Estimate::new(base).with_evidence(0.75)
    }
}

/// Higher baseline risk, amplified further by diabetes.
fn south_asian(f: &PatientFeatures) -> Estimate {
    let diabetes = if f.diabetes { 1.10 } else { 1.0 };
    adjusted(f, PopulationGroup::SouthAsian, 1.35 * diabetes)
}

/// Lower coronary baseline; stroke burden raises the weight of hypertension.
fn east_asian(f: &PatientFeatures) -> Estimate {
    let hypertension = if f.systolic_bp >= 140.0 { 1.15 } else { 1.0 };
    adjusted(f, PopulationGroup::EastAsian, 0.85 * hypertension)
}

fn african(f: &PatientFeatures) -> Estimate {
    let hypertension = if f.systolic_bp >= 140.0 { 1.10 } else { 1.0 };
    adjusted(f, PopulationGroup::African, 1.20 * hypertension)
}

fn hispanic(f: &PatientFeatures) -> Estimate {
    let diabetes = if f.diabetes { 1.10 } else { 1.0 };
    adjusted(f, PopulationGroup::Hispanic, 1.10 * diabetes)
}
