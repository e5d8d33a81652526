use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::CardioError;

/// An HTTP client that only talks to approved hosts.
/// Patient-derived prompts must never leave for an arbitrary URL, so every
/// outbound provider call goes through this allowlist.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist of LLM provider hosts.
    pub fn new(timeout: Duration) -> Result<Self, CardioError> {
        let domains = [
            "generativelanguage.googleapis.com", // Gemini
            "api.openai.com",                    // OpenAI
            "localhost",                         // local proxies / tests
            "127.0.0.1",
        ];

        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(|e| CardioError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current sandbox policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                // Check exact match or if it's a subdomain of an allowed domain
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, CardioError> {
        if !self.is_allowed(url) {
            tracing::warn!(host = %host_of(url), "Blocked outbound request to non-allowlisted host");
            return Err(CardioError::SecurityError(format!(
                "host not in provider allowlist: {}",
                host_of(url)
            )));
        }

        Ok(self.client.post(url))
    }
}

/// Host part only; provider URLs can carry API keys in the query string.
fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "<unparseable>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_hosts_allowed() {
        let client = SandboxClient::new(Duration::from_secs(5)).unwrap();
        assert!(client.is_allowed("https://api.openai.com/v1/chat/completions"));
        assert!(client.is_allowed(
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        ));
        assert!(client.is_allowed("http://127.0.0.1:9999/v1/chat/completions"));
    }

    #[test]
    fn test_unknown_host_blocked_without_leaking_query() {
        let client = SandboxClient::new(Duration::from_secs(5)).unwrap();
        let err = client.post("https://evil.example.com/collect?key=secret").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("evil.example.com"));
        assert!(!msg.contains("secret"));
    }

    #[test]
    fn test_allow_domain_extends_list() {
        let mut client = SandboxClient::new(Duration::from_secs(5)).unwrap();
        assert!(!client.is_allowed("https://llm-proxy.internal/v1"));
        client.allow_domain("llm-proxy.internal");
        assert!(client.is_allowed("https://llm-proxy.internal/v1"));
    }
}
