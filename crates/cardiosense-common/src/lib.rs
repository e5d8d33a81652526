//! cardiosense-common: Shared types, errors, and configuration used across all CardioSense crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod config;
pub mod sandbox;
pub mod sanitize;

// Re-export commonly used types
pub use config::{CardioConfig, HistoryConfig, ScoringConfig, ProjectionConfig, LlmConfig, ProviderConfig};
pub use entities::{PatientInput, RiskLevel, RiskTrend, Gender, PopulationGroup, ActivityLevel};
pub use error::{CardioError, Result};
