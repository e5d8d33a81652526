//! cardiosense-advisor: Lifestyle, medicine, Ayurveda, yoga and diet
//! recommendations on top of a risk assessment, with an LLM provider chain
//! in front of deterministic fallback rules.

pub mod fallback;
pub mod llm_scorer;
pub mod prompt;
pub mod request;
pub mod service;
pub mod warnings;

pub use llm_scorer::LlmRiskScorer;
pub use request::{Category, RecommendationRequest, RecommendationResponse, RequestType, Source, Suggestions};
pub use service::AdvisorService;
pub use warnings::DISCLAIMER;
