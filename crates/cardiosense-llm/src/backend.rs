//! LLM backend trait and the generic HTTP provider adapter.
//!
//! Gemini and OpenAI differ only in how a request is laid out and where the
//! text sits in the response. `HttpBackend<M>` owns everything else: the
//! sandboxed client, credentials, status handling and error mapping.
//! A `ProviderMapping` supplies the provider-specific shape.
//!
//! Mappings:
//!   GeminiMapping: generativelanguage.googleapis.com `generateContent`
//!   OpenAiMapping: api.openai.com `chat/completions` (and compatible proxies)

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cardiosense_common::sandbox::SandboxClient;
use cardiosense_common::ProviderConfig;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Request blocked by policy: {0}")]
    PolicyBlocked(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("All providers failed: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}

// ── Request / Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,   // "system" | "user" | "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON-only response where supported
    #[serde(default)]
    pub json_mode: bool,
}

impl LlmRequest {
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError>;
    /// Provider name reported to callers ("gemini", "openai", ...)
    fn provider(&self) -> &str;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

// ── Provider mapping ──────────────────────────────────────────────────────────

/// Provider-specific request layout.
#[derive(Debug, Clone)]
pub struct HttpRequestParts {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

/// Generation settings applied when the request leaves them unset.
#[derive(Debug, Clone, Copy)]
pub struct GenerationDefaults {
    pub max_tokens: u32,
    pub temperature: f32,
}

pub trait ProviderMapping: Send + Sync {
    fn provider(&self) -> &'static str;

    fn default_base_url(&self) -> &'static str;

    fn build_request(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        req: &LlmRequest,
        defaults: GenerationDefaults,
    ) -> HttpRequestParts;

    fn parse_response(&self, json: &serde_json::Value, model: &str) -> Result<LlmResponse, LlmError>;
}

// ── Generic HTTP backend ──────────────────────────────────────────────────────

pub struct HttpBackend<M: ProviderMapping> {
    mapping: M,
    base_url: String,
    model: String,
    api_key: SecretString,
    defaults: GenerationDefaults,
    timeout: Duration,
    client: SandboxClient,
}

impl<M: ProviderMapping> HttpBackend<M> {
    /// Build a backend from a provider config block. A custom `base_url`
    /// is added to the sandbox allowlist; an empty one selects the
    /// provider's public endpoint.
    pub fn new(
        mapping: M,
        config: &ProviderConfig,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let base_url = if config.base_url.trim().is_empty() {
            mapping.default_base_url().to_string()
        } else {
            config.base_url.trim_end_matches('/').to_string()
        };

        let mut client = SandboxClient::new(timeout)
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        if let Some(host) = host_of(&base_url) {
            client.allow_domain(&host);
        }

        Ok(Self {
            mapping,
            base_url,
            model: config.model.clone(),
            api_key,
            defaults: GenerationDefaults {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            // Drop the URL so credentials never reach logs
            LlmError::Http(e.without_url())
        }
    }
}

#[async_trait]
impl<M: ProviderMapping> LlmBackend for HttpBackend<M> {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.clone().unwrap_or_else(|| self.model.clone());
        let parts = self.mapping.build_request(
            &self.base_url,
            &model,
            self.api_key.expose_secret(),
            &req,
            self.defaults,
        );

        let mut builder = self
            .client
            .post(&parts.url)
            .map_err(|e| LlmError::PolicyBlocked(e.to_string()))?;
        for (name, value) in parts.headers {
            builder = builder.header(name, value);
        }

        let resp = builder
            .json(&parts.body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let json = check_response_status(resp).await?;
        self.mapping.parse_response(&json, &model)
    }

    fn provider(&self) -> &str {
        self.mapping.provider()
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    fn is_local(&self) -> bool {
        matches!(host_of(&self.base_url).as_deref(), Some("localhost") | Some("127.0.0.1"))
    }
}

fn host_of(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

async fn check_response_status(resp: reqwest::Response) -> Result<serde_json::Value, LlmError> {
    let status = resp.status().as_u16();
    if status == 429 {
        return Err(LlmError::RateLimitExceeded);
    }
    let text = resp.text().await.map_err(|e| LlmError::Http(e.without_url()))?;
    let body: Option<serde_json::Value> = serde_json::from_str(&text).ok();

    if status >= 400 {
        let msg = body
            .as_ref()
            .and_then(|b| {
                b["error"]["message"]
                    .as_str()
                    .or_else(|| b["message"].as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| truncate(&text, 200));
        return Err(LlmError::ApiError { status, message: msg });
    }

    body.ok_or_else(|| LlmError::MalformedResponse("response body is not JSON".to_string()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}…")
}

// ── 1. Google Gemini ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiMapping;

impl ProviderMapping for GeminiMapping {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    fn default_base_url(&self) -> &'static str {
        "https://generativelanguage.googleapis.com/v1beta"
    }

    fn build_request(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        req: &LlmRequest,
        defaults: GenerationDefaults,
    ) -> HttpRequestParts {
        // System message → systemInstruction
        let system_text = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone());

        let contents: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": m.content }]
                })
            })
            .collect();

        let mut generation_config = serde_json::json!({
            "maxOutputTokens": req.max_tokens.unwrap_or(defaults.max_tokens),
            "temperature":     req.temperature.unwrap_or(defaults.temperature),
        });
        if req.json_mode {
            generation_config["responseMimeType"] = serde_json::json!("application/json");
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if let Some(sys) = system_text {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": sys }]
            });
        }

        HttpRequestParts {
            url: format!("{}/models/{}:generateContent", base_url, model),
            // Header, not query string, so the key never appears in a URL
            headers: vec![("x-goog-api-key", api_key.to_string())],
            body,
        }
    }

    fn parse_response(&self, json: &serde_json::Value, model: &str) -> Result<LlmResponse, LlmError> {
        if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
            return Err(LlmError::PolicyBlocked(format!("gemini blocked prompt: {reason}")));
        }
        if json["candidates"][0]["finishReason"].as_str() == Some("SAFETY") {
            return Err(LlmError::PolicyBlocked("gemini stopped on safety".to_string()));
        }

        let content = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LlmError::MalformedResponse("gemini response has no candidate text".to_string()))?
            .to_string();

        Ok(LlmResponse {
            content,
            model: json["modelVersion"].as_str().unwrap_or(model).to_string(),
            prompt_tokens:     json["usageMetadata"]["promptTokenCount"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usageMetadata"]["candidatesTokenCount"].as_u64().unwrap_or(0) as u32,
        })
    }
}

// ── 2. OpenAI ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiMapping;

impl ProviderMapping for OpenAiMapping {
    fn provider(&self) -> &'static str {
        "openai"
    }

    fn default_base_url(&self) -> &'static str {
        "https://api.openai.com/v1"
    }

    fn build_request(
        &self,
        base_url: &str,
        model: &str,
        api_key: &str,
        req: &LlmRequest,
        defaults: GenerationDefaults,
    ) -> HttpRequestParts {
        let mut body = serde_json::json!({
            "model":       model,
            "messages":    req.messages,
            "max_tokens":  req.max_tokens.unwrap_or(defaults.max_tokens),
            "temperature": req.temperature.unwrap_or(defaults.temperature),
        });
        if req.json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        HttpRequestParts {
            url: format!("{}/chat/completions", base_url),
            headers: vec![("authorization", format!("Bearer {}", api_key))],
            body,
        }
    }

    fn parse_response(&self, json: &serde_json::Value, model: &str) -> Result<LlmResponse, LlmError> {
        if json["choices"][0]["finish_reason"].as_str() == Some("content_filter") {
            return Err(LlmError::PolicyBlocked("openai content filter".to_string()));
        }

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LlmError::MalformedResponse("openai response has no message content".to_string()))?
            .to_string();

        Ok(LlmResponse {
            content,
            model: json["model"].as_str().unwrap_or(model).to_string(),
            prompt_tokens:     json["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: json["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        })
    }
}

pub type GeminiBackend = HttpBackend<GeminiMapping>;
pub type OpenAiBackend = HttpBackend<OpenAiMapping>;

// ── Tests ─────────────────────────────────────────────────────────────────────
