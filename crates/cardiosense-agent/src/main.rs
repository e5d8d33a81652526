//! CardioSense: cardiovascular risk scoring and recommendation service
//! Entry point for the server binary.

mod config;

use std::sync::Arc;

use cardiosense_advisor::AdvisorService;
use cardiosense_llm::chain_from_config;
use cardiosense_scoring::RiskEngine;
use cardiosense_web::history::HistoryStore;
use cardiosense_web::{build_router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables take precedence
    let _ = dotenvy::dotenv();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cardiosense=debug,info")),
        )
        .init();

    info!("CardioSense starting up...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = config::load()?;
    info!(
        providers = ?config.configured_providers(),
        llm_enabled = config.llm.enabled,
        ai_scorer = config.llm.ai_scorer,
        "Configuration loaded"
    );

    // Scoring engine
    let engine = Arc::new(RiskEngine::from_config(&config));
    info!(models = engine.model_count(), "Risk engine ready");

    // LLM provider chain; providers without a key are skipped
    let chain = Arc::new(chain_from_config(&config.llm)?);
    if chain.is_empty() {
        tracing::warn!(
            "No LLM providers available. Recommendations will use the rule-based fallback. \
             Set CARDIOSENSE_GEMINI_API_KEY or CARDIOSENSE_OPENAI_API_KEY to enable them."
        );
    } else {
        info!(providers = ?chain.providers(), "LLM provider chain ready");
    }

    let advisor = Arc::new(AdvisorService::new(&config.llm, chain, engine));
    let history = HistoryStore::from_config(&config.history).await?;
    let state = AppState::new(advisor, history);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("API listening on http://{}", config.server.bind);
    info!("   Predict:         POST /api/predict");
    info!("   Recommendations: POST /api/recommendations");
    info!("   Health:          GET  /api/health");
    info!("CardioSense ready. Press Ctrl+C to stop.");

    axum::serve(listener, router).await?;

    Ok(())
}
