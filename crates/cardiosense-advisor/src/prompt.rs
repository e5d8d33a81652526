//! Prompt construction.
//!
//! Prompts carry only derived, rounded clinical context. No free-text
//! patient fields exist, so nothing identifying can leak in by accident.

use cardiosense_llm::{LlmRequest, Message};
use cardiosense_scoring::{EnsembleResult, PatientFeatures};

use crate::request::RequestType;

const ADVISOR_SYSTEM: &str = "You are a cardiovascular health educator. \
You give conservative, general lifestyle guidance and never diagnose or prescribe. \
Reply with a single JSON object and nothing else.";

const SCORER_SYSTEM: &str = "You estimate 10-year cardiovascular risk for education only. \
Reply with a single JSON object and nothing else.";

pub fn patient_summary(f: &PatientFeatures) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    format!(
        "age {age:.0}, sex {sex:?}, blood pressure {sbp:.0}/{dbp:.0} mmHg, total cholesterol {tc:.0} mg/dL, \
HDL {hdl:.0} mg/dL, LDL {ldl:.0} mg/dL, fasting glucose {glu:.0} mg/dL, BMI {bmi:.1}, \
smoker {smoker}, diabetes {diabetes}, family history {fh}, activity {activity:?}, population {population}",
        age = f.age,
        sex = f.gender,
        sbp = f.systolic_bp,
        dbp = f.diastolic_bp,
        tc = f.total_cholesterol,
        hdl = f.hdl_cholesterol,
        ldl = f.ldl_cholesterol,
        glu = f.fasting_glucose,
        bmi = f.bmi,
        smoker = yes_no(f.smoker),
        diabetes = yes_no(f.diabetes),
        fh = yes_no(f.family_history),
        activity = f.activity_level,
        population = f.population.as_str(),
    )
}

pub fn recommendation_request(
    features: &PatientFeatures,
    ensemble: &EnsembleResult,
    request_type: RequestType,
) -> LlmRequest {
    let categories: Vec<&str> = request_type.categories().iter().map(|c| c.as_str()).collect();
    let schema = categories
        .iter()
        .map(|c| format!("\"{c}\": [\"...\"]"))
        .collect::<Vec<_>>()
        .join(", ");

    let user = format!(
        "Patient: {summary}.\n\
Estimated risk: {score:.1}% ({level}).\n\
Give 3 to 5 short, specific suggestions for each of: {list}. \
Ayurveda and yoga names may use IAST transliteration. \
Add up to 2 safety warnings.\n\
Respond as: {{\"suggestions\": {{{schema}}}, \"warnings\": [\"...\"]}}",
        summary = patient_summary(features),
        score = ensemble.final_score,
        level = ensemble.risk_level,
        list = categories.join(", "),
    );

    LlmRequest {
        messages: vec![Message::system(ADVISOR_SYSTEM), Message::user(user)],
        json_mode: true,
        ..Default::default()
    }
}

pub fn scoring_request(features: &PatientFeatures) -> LlmRequest {
    let user = format!(
        "Patient: {}.\n\
Respond as: {{\"riskScore\": <number 0-100>, \"confidence\": <number 0-100>}}",
        patient_summary(features)
    );
    LlmRequest {
        messages: vec![Message::system(SCORER_SYSTEM), Message::user(user)],
        temperature: Some(0.0),
        json_mode: true,
        ..Default::default()
    }
}
