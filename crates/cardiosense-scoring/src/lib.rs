//! cardiosense-scoring: Heuristic cardiovascular risk ensemble.
//!
//! Feature extraction, a registry of 19 fixed-coefficient scoring models,
//! weighted ensemble aggregation with disagreement penalty and population
//! calibration, risk classification, temporal projection and drift
//! statistics.

pub mod bank;
pub mod classifier;
pub mod drift;
pub mod engine;
pub mod ensemble;
pub mod features;
pub mod model;
pub mod normalise;
pub mod projection;
pub mod weights;

pub use bank::ModelBank;
pub use classifier::RiskThresholds;
pub use engine::{RiskAssessment, RiskEngine};
pub use ensemble::{EnsembleConfig, EnsembleResult};
pub use features::{extract_features, PatientFeatures};
pub use model::{ExternalScore, ExternalScorer, ModelFamily, ModelPrediction, ModelSpec, Scorer, ScoringError};
pub use projection::{ProjectionPoint, TemporalProjection, TemporalProjector};
