//! "ML-advanced" family. Despite the names these are hand-written
//! if/else point tables and fixed-weight formulas that imitate the output
//! shape of each model type. Nothing here was fitted to data.

use crate::features::PatientFeatures;
use crate::model::{Estimate, HeuristicModel, ModelFamily, ModelSpec};
use crate::normalise::logistic_percent;

use super::{flag, Terms};

pub(crate) fn models() -> Vec<HeuristicModel> {
    let family = ModelFamily::MlAdvanced;
    vec![
        HeuristicModel::new(ModelSpec::new("gradient_boosting", family, 1.2, 0.89, 88.0), gradient_boosting),
        HeuristicModel::new(ModelSpec::new("random_forest", family, 1.1, 0.87, 86.0), random_forest),
        HeuristicModel::new(ModelSpec::new("neural_network", family, 1.0, 0.86, 84.0), neural_network),
        HeuristicModel::new(ModelSpec::new("support_vector", family, 0.9, 0.84, 80.0), support_vector),
        HeuristicModel::new(ModelSpec::new("logistic_regression", family, 0.9, 0.83, 82.0), logistic_regression),
        HeuristicModel::new(ModelSpec::new("lightgbm", family, 1.1, 0.88, 87.0), lightgbm),
    ]
}

/// Additive "boosting stages", one threshold ladder per factor.
fn gradient_boosting(f: &PatientFeatures) -> Estimate {
    let mut points = 2.0;

    points += match f.age {
        a if a >= 65.0 => 18.0,
        a if a >= 55.0 => 12.0,
        a if a >= 45.0 => 6.0,
        a if a >= 35.0 => 2.0,
        _ => 0.0,
    };
    points += match f.systolic_bp {
        s if s >= 160.0 => 14.0,
        s if s >= 140.0 => 9.0,
        s if s >= 130.0 => 4.0,
        _ => 0.0,
    };
    points += match f.total_cholesterol {
        c if c >= 280.0 => 10.0,
        c if c >= 240.0 => 7.0,
        c if c >= 200.0 => 3.0,
        _ => 0.0,
    };
    points += 5.0 * flag(f.hdl_cholesterol < 40.0)
        + 12.0 * flag(f.smoker)
        + 12.0 * flag(f.diabetes)
        + 5.0 * flag(f.family_history)
        + 4.0 * flag(f.bmi >= 30.0);

    Estimate::new(points)
}

/// Mean of five shallow decision "trees".
fn random_forest(f: &PatientFeatures) -> Estimate {
    let vascular = if f.age >= 60.0 {
        if f.systolic_bp >= 150.0 { 55.0 } else { 30.0 }
    } else if f.age >= 45.0 {
        if f.systolic_bp >= 140.0 { 28.0 } else { 12.0 }
    } else if f.systolic_bp >= 140.0 {
        10.0
    } else {
        3.0
    };

    let lipids = if f.total_cholesterol >= 240.0 {
        if f.hdl_cholesterol < 40.0 { 45.0 } else { 30.0 }
    } else if f.total_cholesterol >= 200.0 {
        15.0
    } else {
        5.0
    };

    let behaviour = match (f.smoker, f.diabetes) {
        (true, true) => 60.0,
        (true, false) | (false, true) => 32.0,
        (false, false) => 4.0,
    };

    let metabolic = match f.metabolic_risk_count {
        0 => 3.0,
        1 => 10.0,
        2 => 20.0,
        3 => 32.0,
        _ => 45.0,
    };

    let heredity = if f.family_history {
        if f.age >= 50.0 { 35.0 } else { 12.0 }
    } else if f.age >= 55.0 {
        22.0
    } else {
        4.0
    };

    Estimate::new((vascular + lipids + behaviour + metabolic + heredity) / 5.0)
}

/// Two-layer network with fixed weights: three tanh hidden units
/// (vascular age, metabolic load, behaviour/history) into a logistic output.
fn neural_network(f: &PatientFeatures) -> Estimate {
    let t = Terms::of(f);

    let vascular = (0.6 * t.age + 0.5 * t.systolic + 0.2 * t.cholesterol).tanh();
    let metabolic = (0.4 * t.cholesterol - 0.5 * t.hdl + 0.3 * t.bmi + 0.4 * t.glucose).tanh();
    let behaviour = (0.8 * flag(f.smoker) + 0.8 * flag(f.diabetes) + 0.4 * flag(f.family_history)).tanh();

    Estimate::new(logistic_percent(-1.6 + 1.4 * vascular + 0.8 * metabolic + 1.2 * behaviour))
}

/// Signed distance from a fixed hyperplane, Platt-scaled to a percentage.
fn support_vector(f: &PatientFeatures) -> Estimate {
    let t = Terms::of(f);
    let margin = 0.55 * t.age + 0.5 * t.systolic + 0.3 * t.cholesterol - 0.3 * t.hdl
        + 0.7 * flag(f.smoker)
        + 0.7 * flag(f.diabetes)
        + 0.3 * flag(f.family_history)
        - 0.8;
    Estimate::new(logistic_percent(1.2 * margin - 1.2))
}

/// Log-odds in raw clinical units.
fn logistic_regression(f: &PatientFeatures) -> Estimate {
    Estimate::new(logistic_percent(
        -7.5 + 0.055 * f.age + 0.018 * f.systolic_bp + 0.006 * f.total_cholesterol
            - 0.02 * f.hdl_cholesterol
            + 0.60 * flag(f.smoker)
            + 0.65 * flag(f.diabetes)
            + 0.35 * flag(f.family_history)
            + 0.25 * flag(f.gender.is_male()),
    ))
}

/// Histogram-binned leaf values summed in log-odds space.
fn lightgbm(f: &PatientFeatures) -> Estimate {
    let age_leaf = match f.age {
        a if a < 40.0 => -0.8,
        a if a < 50.0 => 0.0,
        a if a < 60.0 => 0.5,
        a if a < 70.0 => 1.0,
        _ => 1.4,
    };
    let bp_leaf = match f.systolic_bp {
        s if s < 120.0 => -0.3,
        s if s < 140.0 => 0.2,
        s if s < 160.0 => 0.6,
        _ => 1.0,
    };
    let ratio_leaf = match f.total_hdl_ratio {
        r if r < 3.5 => -0.2,
        r if r < 5.0 => 0.2,
        _ => 0.6,
    };

    Estimate::new(logistic_percent(
        -3.0 + age_leaf + bp_leaf + ratio_leaf
            + 0.6 * flag(f.smoker)
            + 0.7 * flag(f.diabetes)
            + 0.3 * flag(f.family_history)
            + 0.3 * flag(f.bmi >= 30.0),
    ))
}
