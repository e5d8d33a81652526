//! Axum router: maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use std::sync::Arc;
use crate::state::{AppState, SharedState};
use crate::handlers::{
    history::history,
    predict::{batch_predict, predict},
    projection::projection,
    recommendations::recommendations,
    system::{health, model_info, root},
};
use crate::sse::sse_handler;

/// Build and return the full Axum router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/",                        get(root))

        // Scoring
        .route("/api/predict",             post(predict))
        .route("/api/batch-predict",       post(batch_predict))
        .route("/api/projection",          post(projection))

        // Advice
        .route("/api/recommendations",     post(recommendations))

        // History and service info
        .route("/api/history/{user_id}",   get(history))
        .route("/api/health",              get(health))
        .route("/api/model-info",          get(model_info))

        // SSE streaming
        .route("/api/events",              get(sse_handler))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
