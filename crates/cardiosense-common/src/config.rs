//! Runtime configuration for CardioSense.
//!
//! Every field has a serde default so a partial (or missing) config file
//! still yields a usable configuration. Loaded from TOML by the agent
//! binary; YAML and JSON loaders are provided for tooling and tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::{PopulationGroup, RiskTrend};
use crate::error::{CardioError, Result};

/// Complete service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CardioConfig {
    /// Ensemble, calibration and classifier settings
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Temporal projection heuristic
    #[serde(default)]
    pub projection: ProjectionConfig,

    /// LLM providers, timeouts and retries
    #[serde(default)]
    pub llm: LlmConfig,

    /// In-memory prediction history
    #[serde(default)]
    pub history: HistoryConfig,

    /// HTTP server
    #[serde(default)]
    pub server: ServerConfig,
}

// ── Scoring ──────────────────────────────────────────────────────────────────

/// Canonical risk-band cut-points and ensemble adjustments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Scores at or above this are at least `medium`
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,

    /// Scores at or above this are at least `high`
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,

    /// Scores at or above this are `very-high`
    #[serde(default = "default_very_high_threshold")]
    pub very_high_threshold: f64,

    /// Variance of raw model scores above which the disagreement penalty applies
    #[serde(default = "default_variance_threshold")]
    pub variance_threshold: f64,

    /// Multiplier (>= 1) applied when models disagree
    #[serde(default = "default_disagreement_penalty")]
    pub disagreement_penalty: f64,

    /// Population calibration multipliers, keyed by group
    #[serde(default = "default_calibration")]
    pub calibration: HashMap<PopulationGroup, f64>,
}

fn default_medium_threshold() -> f64 { 10.0 }
fn default_high_threshold() -> f64 { 20.0 }
fn default_very_high_threshold() -> f64 { 40.0 }
fn default_variance_threshold() -> f64 { 225.0 }
fn default_disagreement_penalty() -> f64 { 1.10 }

fn default_calibration() -> HashMap<PopulationGroup, f64> {
    HashMap::from([
        (PopulationGroup::General,    1.00),
        (PopulationGroup::SouthAsian, 1.15),
        (PopulationGroup::EastAsian,  0.95),
        (PopulationGroup::African,    1.10),
        (PopulationGroup::Hispanic,   1.05),
        (PopulationGroup::European,   1.00),
    ])
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            medium_threshold: default_medium_threshold(),
            high_threshold: default_high_threshold(),
            very_high_threshold: default_very_high_threshold(),
            variance_threshold: default_variance_threshold(),
            disagreement_penalty: default_disagreement_penalty(),
            calibration: default_calibration(),
        }
    }
}

impl ScoringConfig {
    /// Thresholds must be strictly increasing inside (0, 100), the penalty
    /// must not reduce scores, and calibration factors must be positive.
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("medium_threshold", self.medium_threshold),
            ("high_threshold", self.high_threshold),
            ("very_high_threshold", self.very_high_threshold),
            ("variance_threshold", self.variance_threshold),
            ("disagreement_penalty", self.disagreement_penalty),
        ];
        if let Some((name, value)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CardioError::Config(format!("{} must be a finite number, got {}", name, value)));
        }
        let t = [self.medium_threshold, self.high_threshold, self.very_high_threshold];
        if !(t[0] > 0.0 && t[0] < t[1] && t[1] < t[2] && t[2] < 100.0) {
            return Err(CardioError::Config(format!(
                "risk thresholds must be strictly increasing in (0, 100), got {:?}",
                t
            )));
        }
        if self.disagreement_penalty < 1.0 {
            return Err(CardioError::Config(format!(
                "disagreement_penalty must be >= 1.0, got {}",
                self.disagreement_penalty
            )));
        }
        if self.variance_threshold < 0.0 {
            return Err(CardioError::Config("variance_threshold must be non-negative".into()));
        }
        if let Some((group, factor)) = self.calibration.iter().find(|(_, f)| !(f.is_finite() && **f > 0.0)) {
            return Err(CardioError::Config(format!(
                "calibration factor for {} must be positive and finite, got {}",
                group.as_str(),
                factor
            )));
        }
        Ok(())
    }
}

// ── Projection ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Points per year when the trend is improving
    #[serde(default = "default_improving_rate")]
    pub improving_rate: f64,

    #[serde(default = "default_stable_rate")]
    pub stable_rate: f64,

    #[serde(default = "default_worsening_rate")]
    pub worsening_rate: f64,

    /// Projection horizons in years
    #[serde(default = "default_horizons")]
    pub horizons: Vec<u32>,

    /// Age at which the accelerator starts growing above 1.0
    #[serde(default = "default_accelerator_onset")]
    pub accelerator_onset_age: f64,

    /// Years over which the accelerator gains +1.0
    #[serde(default = "default_accelerator_span")]
    pub accelerator_span_years: f64,
}

fn default_improving_rate() -> f64 { -0.8 }
fn default_stable_rate() -> f64 { 0.5 }
fn default_worsening_rate() -> f64 { 1.5 }
fn default_horizons() -> Vec<u32> { vec![1, 5, 10] }
fn default_accelerator_onset() -> f64 { 40.0 }
fn default_accelerator_span() -> f64 { 50.0 }

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            improving_rate: default_improving_rate(),
            stable_rate: default_stable_rate(),
            worsening_rate: default_worsening_rate(),
            horizons: default_horizons(),
            accelerator_onset_age: default_accelerator_onset(),
            accelerator_span_years: default_accelerator_span(),
        }
    }
}

impl ProjectionConfig {
    pub fn rate_for(&self, trend: RiskTrend) -> f64 {
        match trend {
            RiskTrend::Improving => self.improving_rate,
            RiskTrend::Stable    => self.stable_rate,
            RiskTrend::Worsening => self.worsening_rate,
        }
    }
}

// ── LLM providers ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Master switch; when false the advisor always uses the fallback rules
    #[serde(default = "default_true")]
    pub enabled: bool,

    pub gemini: Option<ProviderConfig>,
    pub openai: Option<ProviderConfig>,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt, per provider
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Add the LLM-backed "AI model" to the scoring ensemble
    #[serde(default)]
    pub ai_scorer: bool,
}

fn default_true() -> bool { true }
fn default_timeout_secs() -> u64 { 25 }
fn default_max_retries() -> u32 { 2 }
fn default_initial_backoff_ms() -> u64 { 500 }
fn default_max_backoff_ms() -> u64 { 4_000 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gemini: None,
            openai: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            ai_scorer: false,
        }
    }
}

/// One provider block (`[llm.gemini]` / `[llm.openai]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub model: String,

    /// Override for self-hosted proxies; empty means the provider default
    #[serde(default)]
    pub base_url: String,

    /// Never written back out; prefer the environment variable
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 { 2048 }
fn default_temperature() -> f32 { 0.4 }

// ── History / server ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Entries kept per user, in memory and on disk
    #[serde(default = "default_max_per_user")]
    pub max_per_user: usize,

    /// Users held in the in-memory cache; the least recently written is evicted
    #[serde(default = "default_max_users")]
    pub max_users: usize,

    /// SQLite URL for persisted history. Empty keeps history in memory only.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

fn default_max_per_user() -> usize { 500 }
fn default_max_users() -> usize { 10_000 }
fn default_database_url() -> String { "sqlite://cardiosense_history.db".to_string() }

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_per_user: default_max_per_user(),
            max_users: default_max_users(),
            database_url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "0.0.0.0:8000".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl CardioConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.scoring.validate()?;
        Ok(config)
    }

    /// Load from YAML file
    pub fn from_yaml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.scoring.validate()?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.scoring.validate()?;
        Ok(config)
    }

    /// Names of providers that have a config block, in priority order.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.llm.gemini.is_some() { providers.push("gemini"); }
        if self.llm.openai.is_some() { providers.push("openai"); }
        providers
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
