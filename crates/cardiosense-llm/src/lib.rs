//! cardiosense-llm: LLM provider abstraction.
//! Generic HTTP backend with Gemini and OpenAI mappings, per-provider retry,
//! an ordered provider chain with privacy routing, and an audit trail.

pub mod audit;
pub mod backend;
pub mod chain;
pub mod classification;
pub mod mock;
pub mod parse;
pub mod retry;

pub use audit::{AuditLog, LlmAuditEntry};
pub use backend::{
    GeminiBackend, GeminiMapping, HttpBackend, LlmBackend, LlmError, LlmRequest, LlmResponse, Message,
    OpenAiBackend, OpenAiMapping,
};
pub use chain::{ChainResponse, ProviderChain};
pub use retry::RetryPolicy;

use std::sync::Arc;

use secrecy::SecretString;

use cardiosense_common::LlmConfig;

/// Build the chain from config: Gemini first, OpenAI second. Providers
/// without an API key are skipped with a warning.
pub fn chain_from_config(config: &LlmConfig) -> Result<ProviderChain, LlmError> {
    let policy = RetryPolicy::from(config);
    let mut chain = ProviderChain::new(policy.clone());
    if !config.enabled {
        tracing::info!("LLM advisor disabled; recommendations will use the static fallback");
        return Ok(chain);
    }

    if let Some(gemini) = &config.gemini {
        match gemini.api_key.clone() {
            Some(key) if !key.trim().is_empty() => {
                let backend = HttpBackend::new(GeminiMapping, gemini, SecretString::from(key), policy.timeout)?;
                chain.register_backend(Arc::new(backend));
            }
            _ => tracing::warn!(provider = "gemini", "no API key configured; provider skipped"),
        }
    }
    if let Some(openai) = &config.openai {
        match openai.api_key.clone() {
            Some(key) if !key.trim().is_empty() => {
                let backend = HttpBackend::new(OpenAiMapping, openai, SecretString::from(key), policy.timeout)?;
                chain.register_backend(Arc::new(backend));
            }
            _ => tracing::warn!(provider = "openai", "no API key configured; provider skipped"),
        }
    }
    Ok(chain)
}
