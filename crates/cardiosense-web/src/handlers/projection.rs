//! Temporal projection endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use cardiosense_common::{PatientInput, RiskLevel};
use cardiosense_scoring::TemporalProjection;

use crate::error::ApiError;
use crate::state::SharedState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProjectionResponse {
    pub current_score: f64,
    pub risk_level: RiskLevel,
    /// Projection along the patient's own trend (stable if unset)
    pub projection: TemporalProjection,
    /// Improving, stable and worsening side by side
    pub scenarios: Vec<TemporalProjection>,
}

/// POST /api/projection - Project the patient's risk forward
pub async fn projection(
    State(state): State<SharedState>,
    payload: Result<Json<PatientInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patient) = payload?;
    let assessment = state.advisor.assess(&patient).await;
    let engine = state.advisor.engine();

    let scenarios = engine
        .projector()
        .project_scenarios(assessment.ensemble.final_score, assessment.features.age);

    Ok(Json(ProjectionResponse {
        current_score: assessment.ensemble.final_score,
        risk_level: assessment.ensemble.risk_level,
        projection: assessment.projection,
        scenarios,
    }))
}
