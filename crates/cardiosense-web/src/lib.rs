//! cardiosense-web: HTTP API for CardioSense
//! Provides:
//!   - Single and batch risk prediction
//!   - Temporal projection with trend scenarios
//!   - Recommendations with LLM fallback
//!   - Per-user prediction history, persisted to SQLite
//!   - Health, model info and a live SSE event stream

pub mod error;
pub mod handlers;
pub mod history;
pub mod history_db;
pub mod router;
pub mod sse;
pub mod state;

pub use router::build_router;
pub use state::AppState;
