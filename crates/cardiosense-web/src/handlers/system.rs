//! Service banner, health and model information.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use cardiosense_advisor::DISCLAIMER;
use cardiosense_llm::audit::ProviderStats;
use cardiosense_scoring::weights::WeightEntry;

use crate::state::SharedState;

pub const ENDPOINTS: &[&str] = &[
    "GET  /",
    "POST /api/predict",
    "POST /api/batch-predict",
    "POST /api/projection",
    "POST /api/recommendations",
    "GET  /api/history/{user_id}",
    "GET  /api/health",
    "GET  /api/model-info",
    "GET  /api/events",
];

#[derive(Debug, Serialize, Deserialize)]
pub struct Banner {
    pub service: String,
    pub version: String,
    pub status: String,
    pub endpoints: Vec<String>,
    pub disclaimer: String,
}

/// GET / - Service banner
pub async fn root() -> Json<Banner> {
    Json(Banner {
        service: "CardioSense risk API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        disclaimer: DISCLAIMER.to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub name: String,
    pub calls: usize,
    pub failures: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_count: usize,
    pub total_predictions: u64,
    pub average_latency_ms: f64,
    pub uptime_secs: u64,
    /// Entries held in the in-memory history cache
    pub history_entries: usize,
    /// Users held in the in-memory history cache
    pub history_users: usize,
    pub history_persistent: bool,
    pub llm_enabled: bool,
    pub providers: Vec<ProviderStatus>,
}

/// GET /api/health - Liveness plus counters
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let advisor = &state.advisor;
    let active = advisor.active_providers();
    let stats: BTreeMap<String, ProviderStats> = advisor.chain().audit_log().provider_stats().into_iter().collect();

    let providers = active
        .iter()
        .map(|name| {
            let s = stats.get(name).cloned().unwrap_or_default();
            ProviderStatus { name: name.clone(), calls: s.calls, failures: s.failures }
        })
        .collect();

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_count: advisor.engine().model_count(),
        total_predictions: state.stats.total_predictions(),
        average_latency_ms: state.stats.average_latency_ms(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        history_entries: state.history.total(),
        history_users: state.history.user_count(),
        history_persistent: state.history.is_persistent(),
        llm_enabled: !active.is_empty(),
        providers,
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub model_count: usize,
    pub models: Vec<WeightEntry>,
    pub thresholds: ThresholdInfo,
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThresholdInfo {
    pub medium: f64,
    pub high: f64,
    pub very_high: f64,
}

/// GET /api/model-info - Per-model family, weight, accuracy and normalised weight
pub async fn model_info(State(state): State<SharedState>) -> Json<ModelInfoResponse> {
    let engine = state.advisor.engine();
    let t = engine.ensemble_config().thresholds;
    Json(ModelInfoResponse {
        model_count: engine.model_count(),
        models: engine.weight_table(),
        thresholds: ThresholdInfo { medium: t.medium, high: t.high, very_high: t.very_high },
        note: "Models are fixed-coefficient heuristics for education, not trained or validated predictors."
            .to_string(),
    })
}
