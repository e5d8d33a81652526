//! Shared application state for the web server.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use cardiosense_advisor::AdvisorService;
use cardiosense_common::RiskLevel;

use crate::history::HistoryStore;

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A patient was scored
    PredictionMade { risk_score: f64, risk_level: RiskLevel, model_count: usize },
    /// A batch finished
    BatchCompleted { count: usize },
    /// Recommendations were served
    RecommendationServed { source: String, request_type: String },
}

/// Prediction counters for the health endpoint.
#[derive(Debug, Default)]
pub struct ServiceStats {
    predictions: AtomicU64,
    latency_micros: AtomicU64,
}

impl ServiceStats {
    pub fn record(&self, elapsed_ms: f64) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        self.latency_micros
            .fetch_add((elapsed_ms * 1000.0).max(0.0) as u64, Ordering::Relaxed);
    }

    pub fn total_predictions(&self) -> u64 {
        self.predictions.load(Ordering::Relaxed)
    }

    pub fn average_latency_ms(&self) -> f64 {
        let n = self.total_predictions();
        if n == 0 {
            return 0.0;
        }
        self.latency_micros.load(Ordering::Relaxed) as f64 / 1000.0 / n as f64
    }
}

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub advisor: Arc<AdvisorService>,
    pub history: HistoryStore,
    pub stats: ServiceStats,
    pub started_at: Instant,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(advisor: Arc<AdvisorService>, history: HistoryStore) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            advisor,
            history,
            stats: ServiceStats::default(),
            started_at: Instant::now(),
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Broadcast to SSE subscribers; no subscribers is not an error.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;
