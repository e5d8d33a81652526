//! Ordered provider chain.
//!
//! Providers are tried in registration order. Each one gets the retry
//! policy; when it is exhausted (or its output fails to parse) the chain
//! moves on to the next. Every attempt lands in the audit log.

use std::sync::Arc;
use std::time::Instant;

use crate::audit::{AuditLog, LlmAuditEntry};
use crate::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};
use crate::classification::{DataClass, DataClassifier};
use crate::retry::{complete_with_retry, RetryPolicy};

/// Successful chain call: which provider answered and how hard it was.
#[derive(Debug, Clone)]
pub struct ChainResponse {
    pub provider: String,
    pub response: LlmResponse,
    pub attempts: u32,
    pub latency_ms: u64,
}

pub struct ProviderChain {
    backends: Vec<Arc<dyn LlmBackend>>,
    policy: RetryPolicy,
    classifier: DataClassifier,
    audit: Arc<AuditLog>,
}

impl ProviderChain {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            backends: Vec::new(),
            policy,
            classifier: DataClassifier::default(),
            audit: Arc::new(AuditLog::default()),
        }
    }

    pub fn with_audit_log(mut self, audit: Arc<AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn register_backend(&mut self, backend: Arc<dyn LlmBackend>) {
        tracing::info!(provider = backend.provider(), model = backend.model_id(), "LLM provider registered");
        self.backends.push(backend);
    }

    pub fn with_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.register_backend(backend);
        self
    }

    pub fn providers(&self) -> Vec<String> {
        self.backends.iter().map(|b| b.provider().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// First provider to return any text wins.
    pub async fn complete(&self, req: LlmRequest) -> Result<ChainResponse, LlmError> {
        self.complete_with(req, |_| Ok(())).await.map(|(_, resp)| resp)
    }

    /// First provider whose text `parse` accepts wins. A parse failure
    /// counts as a provider failure and the chain falls through.
    pub async fn complete_with<T, F>(&self, req: LlmRequest, parse: F) -> Result<(T, ChainResponse), LlmError>
    where
        F: Fn(&str) -> Result<T, LlmError>,
    {
        if self.backends.is_empty() {
            return Err(LlmError::Unavailable("no LLM providers configured".to_string()));
        }

        let data_class = self.classifier.classify(&req.prompt_text());
        let mut failures = Vec::new();

        for backend in &self.backends {
            let provider = backend.provider().to_string();

            if data_class == DataClass::Identifiable && !backend.is_local() {
                let err = LlmError::PolicyBlocked(format!(
                    "{} prompt cannot be sent to remote provider",
                    data_class.as_str()
                ));
                tracing::warn!(provider = %provider, "LLM provider skipped by privacy policy");
                self.audit.record(LlmAuditEntry::failure(
                    &provider, backend.model_id(), 0, data_class.as_str(), &err, 0,
                ));
                failures.push(format!("{provider}: {err}"));
                continue;
            }

            let started = Instant::now();
            let (result, attempts) = complete_with_retry(backend.as_ref(), &req, &self.policy).await;
            let latency_ms = started.elapsed().as_millis() as u64;

            let parsed = result.and_then(|resp| parse(&resp.content).map(|value| (value, resp)));
            match parsed {
                Ok((value, response)) => {
                    self.audit.record(LlmAuditEntry::success(
                        &provider, backend.model_id(), attempts, data_class.as_str(), &response, latency_ms,
                    ));
                    tracing::info!(
                        provider = %provider,
                        model = backend.model_id(),
                        attempts,
                        latency_ms,
                        "LLM call succeeded"
                    );
                    return Ok((value, ChainResponse { provider, response, attempts, latency_ms }));
                }
                Err(e) => {
                    self.audit.record(LlmAuditEntry::failure(
                        &provider, backend.model_id(), attempts, data_class.as_str(), &e, latency_ms,
                    ));
                    tracing::warn!(provider = %provider, attempts, error = %e, "LLM provider failed, trying next");
                    failures.push(format!("{provider}: {e}"));
                }
            }
        }

        Err(LlmError::Exhausted(failures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Message;
    use crate::mock::{MockBackend, MockReply};
    use crate::parse::parse_json;
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(50),
            max_retries: 1,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    fn request(text: &str) -> LlmRequest {
        LlmRequest { messages: vec![Message::user(text)], ..Default::default() }
    }

    #[tokio::test]
    async fn test_empty_chain_is_unavailable() {
        let chain = ProviderChain::new(fast_policy());
        assert!(matches!(chain.complete(request("hi")).await, Err(LlmError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_primary_answers() {
        let gemini = Arc::new(MockBackend::always("gemini", MockReply::Text("{\"a\":1}".into())));
        let openai = Arc::new(MockBackend::new("openai"));
        let chain = ProviderChain::new(fast_policy())
            .with_backend(gemini.clone())
            .with_backend(openai.clone());

        let resp = chain.complete(request("hi")).await.unwrap();
        assert_eq!(resp.provider, "gemini");
        assert_eq!(resp.attempts, 1);
        assert_eq!(openai.calls(), 0);
        assert_eq!(chain.audit_log().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_secondary() {
        let gemini = Arc::new(MockBackend::always("gemini", MockReply::ServerError(503)));
        let openai = Arc::new(MockBackend::always("openai", MockReply::Text("{\"b\":2}".into())));
        let chain = ProviderChain::new(fast_policy())
            .with_backend(gemini.clone())
            .with_backend(openai);

        let resp = chain.complete(request("hi")).await.unwrap();
        assert_eq!(resp.provider, "openai");
        assert_eq!(gemini.calls(), 2);
        let stats = chain.audit_log().provider_stats();
        assert_eq!(stats["gemini"].failures, 1);
        assert_eq!(stats["openai"].failures, 0);
    }

    #[tokio::test]
    async fn test_parse_failure_moves_to_next_provider() {
        let gemini = Arc::new(MockBackend::always("gemini", MockReply::Malformed));
        let openai = Arc::new(MockBackend::always("openai", MockReply::Text("```json\n{\"ok\":true}\n```".into())));
        let chain = ProviderChain::new(fast_policy()).with_backend(gemini).with_backend(openai);

        let (value, resp) = chain
            .complete_with(request("hi"), parse_json::<serde_json::Value>)
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(resp.provider, "openai");
    }

    #[tokio::test]
    async fn test_all_failing_reports_each_provider() {
        let chain = ProviderChain::new(fast_policy())
            .with_backend(Arc::new(MockBackend::always("gemini", MockReply::Unavailable)))
            .with_backend(Arc::new(MockBackend::always("openai", MockReply::RateLimited)));

        match chain.complete(request("hi")).await {
            Err(LlmError::Exhausted(failures)) => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].starts_with("gemini"));
                assert!(failures[1].starts_with("openai"));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_identifiable_prompt_stays_local() {
        let remote = Arc::new(MockBackend::new("gemini"));
        let local = Arc::new(MockBackend::always("ollama", MockReply::Text("{}".into())).local());
        let chain = ProviderChain::new(fast_policy())
            .with_backend(remote.clone())
            .with_backend(local.clone());

        let resp = chain.complete(request("email me at pat@example.com")).await.unwrap();
        assert_eq!(resp.provider, "ollama");
        assert_eq!(remote.calls(), 0);
        assert_eq!(local.calls(), 1);
    }

    #[tokio::test]
    async fn test_identifiable_prompt_with_only_remote_is_blocked() {
        let remote = Arc::new(MockBackend::new("gemini"));
        let chain = ProviderChain::new(fast_policy()).with_backend(remote.clone());

        let err = chain.complete(request("ssn 123-45-6789")).await.unwrap_err();
        assert!(matches!(err, LlmError::Exhausted(_)));
        assert_eq!(remote.calls(), 0);
    }
}
