//! Deterministic recommendation rules.
//!
//! Used whenever no provider answers usefully. Every requested category
//! gets at least one item regardless of input, so the user is never left
//! without guidance.

use cardiosense_common::{ActivityLevel, RiskLevel};
use cardiosense_scoring::PatientFeatures;

use crate::request::{Category, RequestType, Suggestions};

pub fn fallback_suggestions(
    features: &PatientFeatures,
    level: RiskLevel,
    request_type: RequestType,
) -> Suggestions {
    let mut out = Suggestions::default();
    for category in request_type.categories() {
        let items = match category {
            Category::Medicines => medicines(features, level),
            Category::Ayurveda  => ayurveda(features, level),
            Category::Yoga      => yoga(features, level),
            Category::Diet      => diet(features, level),
        };
        out.set(*category, items);
    }
    out
}

fn medicines(f: &PatientFeatures, level: RiskLevel) -> Vec<String> {
    let mut items = Vec::new();

    match level {
        RiskLevel::Low => items.push(
            "No routine heart medication is usually indicated at low risk; keep up yearly blood pressure and cholesterol checks."
                .to_string(),
        ),
        RiskLevel::Medium => items.push(
            "Ask your doctor whether a moderate-intensity statin is appropriate for your cholesterol profile.".to_string(),
        ),
        RiskLevel::High | RiskLevel::VeryHigh => {
            items.push("Discuss statin therapy with your doctor; at this risk level it is commonly considered.".to_string());
            items.push(
                "Low-dose aspirin should only be taken if your doctor specifically recommends it.".to_string(),
            );
        }
    }

    if f.bp_risk || f.treated_hypertension {
        items.push(
            "Blood pressure medicines such as ACE inhibitors, ARBs or calcium-channel blockers are prescribed by a doctor after review."
                .to_string(),
        );
    }
    if f.diabetes || f.fasting_glucose >= 126.0 {
        items.push("Review blood-sugar control (for example metformin) and HbA1c targets with your doctor.".to_string());
    }
    if f.smoker {
        items.push("Nicotine replacement or other cessation aids can double quit rates; ask your doctor or pharmacist.".to_string());
    }

    items
}

fn ayurveda(f: &PatientFeatures, level: RiskLevel) -> Vec<String> {
    let mut items = vec![
        "Arjuna (Terminalia arjuna) bark is traditionally used for heart support; take it only under an Ayurvedic practitioner's guidance."
            .to_string(),
        "Garlic (Laśuna) in daily cooking is a traditional aid for healthy circulation.".to_string(),
    ];

    if f.cholesterol_risk || f.ldl_cholesterol >= 160.0 {
        items.push(
            "Guggulu preparations are traditionally used for lipid balance; check for interactions with any prescribed medicine."
                .to_string(),
        );
    }
    if f.bp_risk {
        items.push("Sarpagandhā has a traditional role in blood-pressure care but must never replace prescribed treatment.".to_string());
    }
    if f.bmi >= 25.0 || f.metabolic_risk_count >= 2 {
        items.push("Triphalā at night is traditionally used to support digestion and metabolism.".to_string());
    }
    if level.is_elevated() {
        items.push("Tell your cardiologist about every herbal remedy you take.".to_string());
    }

    items
}

fn yoga(f: &PatientFeatures, level: RiskLevel) -> Vec<String> {
    let mut items = vec![
        "Anuloma Viloma prāṇāyāma (alternate-nostril breathing), 10 minutes daily, to calm the nervous system.".to_string(),
        "Śavāsana (corpse pose) for deep relaxation at the end of every session.".to_string(),
    ];

    if level.is_elevated() || f.bp_risk {
        items.push("Keep practice gentle: Vajrāsana and supported Setu Bandhāsana rather than vigorous flows.".to_string());
        items.push(
            "Avoid inversions such as Śīrṣāsana and breath retention (kumbhaka) until your doctor clears you.".to_string(),
        );
    } else {
        items.push("Sūrya Namaskāra (sun salutation), 6–12 rounds at a comfortable pace.".to_string());
        if f.activity_level == ActivityLevel::Sedentary {
            items.push("Start with 15 minutes of Tāḍāsana and gentle standing poses and build up gradually.".to_string());
        }
    }

    items
}

fn diet(f: &PatientFeatures, level: RiskLevel) -> Vec<String> {
    let mut items = vec![
        "Follow a DASH or Mediterranean-style pattern: vegetables, fruit, whole grains, legumes and nuts.".to_string(),
    ];

    if f.bp_risk || level.is_elevated() {
        items.push("Keep sodium under 1,500 mg a day; avoid pickles, papad and packaged snacks.".to_string());
    } else {
        items.push("Keep sodium under 2,300 mg a day.".to_string());
    }
    if f.cholesterol_risk || f.ldl_cholesterol >= 130.0 {
        items.push("Limit saturated fat (ghee, butter, fried foods) and add soluble fibre such as oats and methi seeds.".to_string());
    }
    if f.diabetes || f.fasting_glucose >= 100.0 {
        items.push("Choose low-glycaemic foods and limit refined sugar and white rice.".to_string());
    }
    if f.bmi >= 30.0 {
        items.push("A 5–10% weight loss through portion control meaningfully lowers heart risk.".to_string());
    }
    if f.triglycerides >= 150.0 {
        items.push("Cut alcohol and sugary drinks to bring triglycerides down.".to_string());
    }

    items
}
