//! Recommendation endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};

use cardiosense_advisor::RecommendationRequest;

use crate::error::ApiError;
use crate::state::{AppEvent, SharedState};

/// POST /api/recommendations - Advice for a patient; always answers
pub async fn recommendations(
    State(state): State<SharedState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let response = state.advisor.recommend(&req.patient, req.request_type).await;

    state.publish(AppEvent::RecommendationServed {
        source: response.source.as_str().to_string(),
        request_type: req.request_type.as_str().to_string(),
    });

    Ok(Json(response))
}
