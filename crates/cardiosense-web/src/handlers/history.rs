//! Prediction history endpoint.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::history::{HistoryEntry, DEFAULT_HISTORY_LIMIT};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub history: Vec<HistoryEntry>,
    pub count: usize,
}

/// GET /api/history/{user_id} - Most recent predictions first
pub async fn history(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }

    let history = state.history.recent(&user_id, limit).await?;
    Ok(Json(HistoryResponse {
        count: history.len(),
        user_id,
        history,
    }))
}
