//! LLM-backed "AI model" for the scoring ensemble.
//!
//! Runs through the same provider chain as the advisor. Any failure
//! surfaces as `ScoringError::External`; the engine drops the model and
//! re-weights over the rest.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use cardiosense_llm::parse::parse_json;
use cardiosense_llm::{LlmError, ProviderChain};
use cardiosense_scoring::{ExternalScore, ExternalScorer, ModelFamily, ModelSpec, PatientFeatures, ScoringError};

use crate::prompt::scoring_request;

pub const AI_MODEL_NAME: &str = "ai_model";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreReply {
    #[serde(alias = "risk_score", alias = "score")]
    risk_score: f64,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 { 60.0 }

pub struct LlmRiskScorer {
    spec: ModelSpec,
    chain: Arc<ProviderChain>,
}

impl LlmRiskScorer {
    pub fn new(chain: Arc<ProviderChain>) -> Self {
        Self {
            spec: ModelSpec::new(AI_MODEL_NAME, ModelFamily::External, 0.8, 0.80, 70.0),
            chain,
        }
    }
}

fn parse_score(text: &str) -> Result<ScoreReply, LlmError> {
    let reply: ScoreReply = parse_json(text)?;
    if !reply.risk_score.is_finite() || !(0.0..=100.0).contains(&reply.risk_score) {
        return Err(LlmError::MalformedResponse(format!("risk score out of range: {}", reply.risk_score)));
    }
    Ok(reply)
}

#[async_trait]
impl ExternalScorer for LlmRiskScorer {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    async fn score(&self, features: &PatientFeatures) -> Result<ExternalScore, ScoringError> {
        let (reply, resp) = self
            .chain
            .complete_with(scoring_request(features), parse_score)
            .await
            .map_err(|e| ScoringError::External {
                name: self.spec.name.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(provider = %resp.provider, score = reply.risk_score, "AI model scored");
        Ok(ExternalScore {
            score: reply.risk_score,
            confidence: reply.confidence.clamp(0.0, 100.0),
        })
    }
}
