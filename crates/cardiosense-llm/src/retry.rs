//! Per-provider timeout and bounded exponential backoff.

use std::time::Duration;

use cardiosense_common::LlmConfig;

use crate::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Hard ceiling on a single attempt
    pub timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for RetryPolicy {
    fn from(config: &LlmConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based): doubles each time, capped.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Transient failures worth another attempt against the same provider.
pub fn is_retryable(error: &LlmError) -> bool {
    match error {
        LlmError::Timeout(_) | LlmError::RateLimitExceeded | LlmError::Http(_) => true,
        LlmError::ApiError { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Run one provider under the policy. Returns the final result and the
/// number of attempts made.
pub async fn complete_with_retry(
    backend: &dyn LlmBackend,
    req: &LlmRequest,
    policy: &RetryPolicy,
) -> (Result<LlmResponse, LlmError>, u32) {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let error = match tokio::time::timeout(policy.timeout, backend.complete(req.clone())).await {
            Ok(Ok(resp)) => return (Ok(resp), attempt),
            Ok(Err(e)) => e,
            Err(_) => LlmError::Timeout(policy.timeout),
        };

        let retries_used = attempt - 1;
        if !is_retryable(&error) || retries_used >= policy.max_retries {
            return (Err(error), attempt);
        }

        let delay = policy.backoff_for(retries_used);
        tracing::warn!(
            provider = backend.provider(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "LLM call failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockReply};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(50),
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_default_policy_values() {
        let p = RetryPolicy::default();
        assert_eq!(p.timeout, Duration::from_secs(25));
        assert_eq!(p.max_retries, 2);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let p = RetryPolicy {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(4000),
            ..fast_policy()
        };
        assert_eq!(p.backoff_for(0), Duration::from_millis(500));
        assert_eq!(p.backoff_for(1), Duration::from_millis(1000));
        assert_eq!(p.backoff_for(3), Duration::from_millis(4000));
        assert_eq!(p.backoff_for(40), Duration::from_millis(4000));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(is_retryable(&LlmError::RateLimitExceeded));
        assert!(is_retryable(&LlmError::Timeout(Duration::from_secs(1))));
        assert!(is_retryable(&LlmError::ApiError { status: 503, message: String::new() }));
        assert!(!is_retryable(&LlmError::ApiError { status: 401, message: String::new() }));
        assert!(!is_retryable(&LlmError::MalformedResponse("x".into())));
        assert!(!is_retryable(&LlmError::PolicyBlocked("x".into())));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let backend = MockBackend::new("gemini")
            .then(MockReply::RateLimited)
            .then(MockReply::Text("{\"ok\":true}".into()));
        let (result, attempts) = complete_with_retry(&backend, &LlmRequest::default(), &fast_policy()).await;
        assert_eq!(result.unwrap().content, "{\"ok\":true}");
        assert_eq!(attempts, 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let backend = MockBackend::always("gemini", MockReply::ServerError(503));
        let (result, attempts) = complete_with_retry(&backend, &LlmRequest::default(), &fast_policy()).await;
        assert!(matches!(result, Err(LlmError::ApiError { status: 503, .. })));
        assert_eq!(attempts, 3);
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let backend = MockBackend::always("openai", MockReply::ServerError(401));
        let (_, attempts) = complete_with_retry(&backend, &LlmRequest::default(), &fast_policy()).await;
        assert_eq!(attempts, 1);
    }

    #[tokio::test]
    async fn test_hung_provider_times_out() {
        let backend = MockBackend::always("gemini", MockReply::Hang(Duration::from_secs(5)));
        let policy = RetryPolicy { max_retries: 0, ..fast_policy() };
        let (result, _) = complete_with_retry(&backend, &LlmRequest::default(), &policy).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
    }
}
