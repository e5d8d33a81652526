//! Recommendation service.
//!
//! Flow: assess the patient, ask the provider chain for suggestions, and
//! fall back to the deterministic rules if no provider produces a usable
//! answer. Every path returns a complete response with a disclaimer.

use std::sync::Arc;

use cardiosense_common::sanitize::sanitize_text;
use cardiosense_common::{LlmConfig, PatientInput};
use cardiosense_llm::parse::{parse_json, string_list};
use cardiosense_llm::{LlmError, ProviderChain};
use cardiosense_scoring::{ExternalScorer, RiskAssessment, RiskEngine};

use crate::fallback::fallback_suggestions;
use crate::llm_scorer::LlmRiskScorer;
use crate::prompt::recommendation_request;
use crate::request::{Category, RecommendationResponse, RequestType, Source, Suggestions};
use crate::warnings::{merge_warnings, risk_warnings, DISCLAIMER};

/// Parsed and sanitized provider advice.
#[derive(Debug, Clone)]
struct ProviderAdvice {
    suggestions: Suggestions,
    warnings: Vec<String>,
}

/// Parse advice and require at least one requested category with content.
/// Items are sanitized first, so an item made only of invisible characters
/// does not count as content.
fn parse_advice(text: &str, wanted: &[Category]) -> Result<ProviderAdvice, LlmError> {
    let value: serde_json::Value = parse_json(text)?;
    // Some providers drop the wrapper and return the categories at top level
    let categories = if value["suggestions"].is_object() { &value["suggestions"] } else { &value };
    let suggestions = Suggestions::from_json(categories, wanted).sanitized();
    if suggestions.non_empty_categories() == 0 {
        return Err(LlmError::MalformedResponse("no usable suggestions".to_string()));
    }
    Ok(ProviderAdvice {
        suggestions,
        warnings: sanitize_all(string_list(&value["warnings"])),
    })
}

fn sanitize_all(items: Vec<String>) -> Vec<String> {
    items
        .iter()
        .map(|w| sanitize_text(w))
        .filter(|w| !w.is_empty())
        .collect()
}

pub struct AdvisorService {
    chain: Arc<ProviderChain>,
    engine: Arc<RiskEngine>,
    llm_enabled: bool,
    ai_scorer: Option<Arc<dyn ExternalScorer>>,
}

impl AdvisorService {
    pub fn new(config: &LlmConfig, chain: Arc<ProviderChain>, engine: Arc<RiskEngine>) -> Self {
        let ai_scorer = (config.enabled && config.ai_scorer && !chain.is_empty())
            .then(|| Arc::new(LlmRiskScorer::new(chain.clone())) as Arc<dyn ExternalScorer>);
        Self {
            llm_enabled: config.enabled,
            chain,
            engine,
            ai_scorer,
        }
    }

    pub fn engine(&self) -> &Arc<RiskEngine> {
        &self.engine
    }

    pub fn chain(&self) -> &Arc<ProviderChain> {
        &self.chain
    }

    /// Providers that will be tried, in order. Empty when the LLM is off.
    pub fn active_providers(&self) -> Vec<String> {
        if self.llm_enabled { self.chain.providers() } else { Vec::new() }
    }

    /// Risk assessment, including the AI model when it is configured.
    pub async fn assess(&self, patient: &PatientInput) -> RiskAssessment {
        match &self.ai_scorer {
            Some(scorer) => {
                self.engine
                    .assess_with_external(patient, std::slice::from_ref(scorer))
                    .await
            }
            None => self.engine.assess(patient),
        }
    }

    pub async fn recommend(&self, patient: &PatientInput, request_type: RequestType) -> RecommendationResponse {
        let assessment = self.assess(patient).await;
        self.recommend_for(&assessment, request_type).await
    }

    /// Recommendations for an existing assessment. Never fails.
    pub async fn recommend_for(&self, assessment: &RiskAssessment, request_type: RequestType) -> RecommendationResponse {
        let wanted = request_type.categories();

        let advice = if self.llm_enabled && !self.chain.is_empty() {
            let req = recommendation_request(&assessment.features, &assessment.ensemble, request_type);
            match self.chain.complete_with(req, |text| parse_advice(text, wanted)).await {
                Ok((advice, resp)) => Some((advice, Source::from_provider(&resp.provider))),
                Err(e) => {
                    tracing::warn!(error = %e, request_type = request_type.as_str(), "LLM advice unavailable, using fallback");
                    None
                }
            }
        } else {
            None
        };

        let rule_warnings = risk_warnings(&assessment.features, &assessment.ensemble);
        let (suggestions, warnings, source) = match advice {
            Some((advice, source)) => {
                // Fill any requested category the provider left empty
                let mut suggestions = advice.suggestions;
                let rules = fallback_suggestions(&assessment.features, assessment.ensemble.risk_level, request_type);
                for category in wanted {
                    if suggestions.get(*category).map_or(true, Vec::is_empty) {
                        if let Some(items) = rules.get(*category) {
                            suggestions.set(*category, items.clone());
                        }
                    }
                }
                (suggestions, merge_warnings(rule_warnings, advice.warnings), source)
            }
            None => (
                fallback_suggestions(&assessment.features, assessment.ensemble.risk_level, request_type),
                rule_warnings,
                Source::Fallback,
            ),
        };

        tracing::info!(
            source = source.as_str(),
            request_type = request_type.as_str(),
            level = %assessment.ensemble.risk_level,
            "recommendations produced"
        );

        RecommendationResponse {
            suggestions: suggestions.sanitized(),
            warnings: sanitize_all(warnings),
            disclaimer: DISCLAIMER.to_string(),
            source,
            risk_level: assessment.ensemble.risk_level,
            risk_score: assessment.ensemble.final_score,
        }
    }
}
