//! Configuration loading for the CardioSense server.
//! Reads cardiosense.toml from the current directory or the path in CARDIOSENSE_CONFIG.

use std::path::Path;

use anyhow::Context;
use cardiosense_common::{CardioConfig, ProviderConfig};

pub const CONFIG_ENV: &str = "CARDIOSENSE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "cardiosense.toml";
pub const GEMINI_KEY_ENV: &str = "CARDIOSENSE_GEMINI_API_KEY";
pub const OPENAI_KEY_ENV: &str = "CARDIOSENSE_OPENAI_API_KEY";
pub const BIND_ENV: &str = "CARDIOSENSE_BIND";

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";


/// Load configuration from the file named by CARDIOSENSE_CONFIG (or
/// cardiosense.toml), then apply environment overrides.
pub fn load() -> anyhow::Result<CardioConfig> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_from(&path)?;
    apply_env(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse a config file, picking the format from the extension.
/// A missing file is not an error: every section has defaults.
pub fn load_from(path: &str) -> anyhow::Result<CardioConfig> {
    let p = Path::new(path);
    if !p.exists() {
        tracing::warn!(path, "Config file not found, using built-in defaults");
        return Ok(CardioConfig::default());
    }

    let ext = p
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let config = match ext.as_str() {
        "yaml" | "yml" => CardioConfig::from_yaml(path),
        "json" => CardioConfig::from_json(path),
        _ => std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| CardioConfig::from_toml_str(&content)),
    };
    config.with_context(|| format!("Invalid config file: {path}"))
}

/// API keys and bind address from the environment.
///
/// A key found in the environment fills an empty `api_key`; a key with no
/// provider block creates one with the default model. `lookup` is injected
/// so tests do not touch the process environment.
pub fn apply_env(config: &mut CardioConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = non_empty(GEMINI_KEY_ENV) {
        fill_key(&mut config.llm.gemini, key, DEFAULT_GEMINI_MODEL);
    }
    if let Some(key) = non_empty(OPENAI_KEY_ENV) {
        fill_key(&mut config.llm.openai, key, DEFAULT_OPENAI_MODEL);
    }
    if let Some(bind) = non_empty(BIND_ENV) {
        config.server.bind = bind;
    }
}

fn fill_key(slot: &mut Option<ProviderConfig>, key: String, default_model: &str) {
    match slot {
        Some(provider) => {
            let has_key = provider.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                provider.api_key = Some(key);
            }
        }
        None => {
            *slot = Some(ProviderConfig {
                model: default_model.to_string(),
                base_url: String::new(),
                api_key: Some(key),
                max_tokens: 2048,
                temperature: 0.4,
            });
        }
    }
}
