//! Risk prediction endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cardiosense_common::{PatientInput, RiskLevel};
use cardiosense_scoring::RiskAssessment;

use crate::error::ApiError;
use crate::history::HistoryEntry;
use crate::state::{AppEvent, SharedState};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const MAX_BATCH: usize = 1_000;

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    /// Model name → score
    pub model_predictions: BTreeMap<String, f64>,
    /// Convex combination before penalty and calibration
    pub ensemble_prediction: f64,
    pub model_agreement: f64,
    pub confidence_interval: (f64, f64),
    pub prediction_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&RiskAssessment> for PredictionResponse {
    fn from(a: &RiskAssessment) -> Self {
        Self {
            risk_score: a.ensemble.final_score,
            risk_level: a.ensemble.risk_level,
            confidence: a.ensemble.confidence,
            model_predictions: a.predictions.iter().map(|p| (p.name.clone(), p.score)).collect(),
            ensemble_prediction: a.ensemble.weighted_score,
            model_agreement: a.ensemble.model_agreement,
            confidence_interval: a.ensemble.confidence_interval,
            prediction_time_ms: a.elapsed_ms,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub patients: Vec<PatientInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub predictions: Vec<PredictionResponse>,
    pub count: usize,
}

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// POST /api/predict - Score one patient
pub async fn predict(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<PatientInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patient) = payload?;
    let assessment = state.advisor.assess(&patient).await;
    state.stats.record(assessment.elapsed_ms);

    let response = PredictionResponse::from(&assessment);

    if let Some(user_id) = user_id(&headers) {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            user_id,
            timestamp: response.timestamp,
            input: patient,
            risk_score: response.risk_score,
            risk_level: response.risk_level,
            confidence: response.confidence,
        };
        // The prediction is still returned when history cannot be persisted
        if let Err(e) = state.history.record(entry).await {
            tracing::warn!("Failed to persist prediction history: {e:#}");
        }
    }

    state.publish(AppEvent::PredictionMade {
        risk_score: response.risk_score,
        risk_level: response.risk_level,
        model_count: assessment.ensemble.model_count,
    });

    Ok(Json(response))
}

/// POST /api/batch-predict - Score many patients
pub async fn batch_predict(
    State(state): State<SharedState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(batch) = payload?;
    if batch.patients.len() > MAX_BATCH {
        return Err(ApiError::TooLarge(format!(
            "batch of {} exceeds the limit of {MAX_BATCH} patients",
            batch.patients.len()
        )));
    }

    let mut predictions = Vec::with_capacity(batch.patients.len());
    for patient in &batch.patients {
        let assessment = state.advisor.assess(patient).await;
        state.stats.record(assessment.elapsed_ms);
        predictions.push(PredictionResponse::from(&assessment));
    }

    let count = predictions.len();
    tracing::info!(count, "batch prediction completed");
    state.publish(AppEvent::BatchCompleted { count });

    Ok(Json(BatchResponse { predictions, count }))
}
