//! Scripted backend for tests and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{LlmBackend, LlmError, LlmRequest, LlmResponse};

#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    RateLimited,
    ServerError(u16),
    Unavailable,
    Malformed,
    /// Sleep, then answer "{}". Pair with a short retry timeout.
    Hang(Duration),
}

pub struct MockBackend {
    provider: String,
    model: String,
    local: bool,
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    /// Answers "{}" once the script runs out.
    pub fn new(provider: impl Into<String>) -> Self {
        Self::always(provider, MockReply::Text("{}".to_string()))
    }

    pub fn always(provider: impl Into<String>, reply: MockReply) -> Self {
        let provider = provider.into();
        Self {
            model: format!("{provider}-mock"),
            provider,
            local: false,
            script: Mutex::new(VecDeque::new()),
            fallback: reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Queue a reply ahead of the fallback.
    pub fn then(self, reply: MockReply) -> Self {
        self.script.lock().unwrap_or_else(|p| p.into_inner()).push_back(reply);
        self
    }

    pub fn local(mut self) -> Self {
        self.local = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn text(&self, content: String) -> LlmResponse {
        LlmResponse {
            completion_tokens: content.split_whitespace().count() as u32,
            content,
            model: self.model.clone(),
            prompt_tokens: 0,
        }
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap_or_else(|p| p.into_inner()) = Some(req.prompt_text());

        match self.next_reply() {
            MockReply::Text(content) => Ok(self.text(content)),
            MockReply::RateLimited => Err(LlmError::RateLimitExceeded),
            MockReply::ServerError(status) => Err(LlmError::ApiError {
                status,
                message: "mock server error".to_string(),
            }),
            MockReply::Unavailable => Err(LlmError::Unavailable(format!("{} is down", self.provider))),
            MockReply::Malformed => Ok(self.text("I cannot produce JSON today.".to_string())),
            MockReply::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.text("{}".to_string()))
            }
        }
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn is_local(&self) -> bool {
        self.local
    }
}
