//! Audit trail for provider calls.
//!
//! Each attempt against a provider (success or failure) is recorded with the
//! SHA-256 of the output rather than the output itself. The log is a bounded
//! in-memory ring; the oldest entries fall off first.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::backend::{LlmError, LlmResponse};

pub const DEFAULT_AUDIT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditEntry {
    pub id: Uuid,
    pub provider: String,
    pub model: String,
    pub attempts: u32,
    pub outcome: AuditOutcome,
    pub data_class: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub output_hash: Option<String>,
    pub latency_ms: u64,
    pub called_at: chrono::DateTime<Utc>,
}

impl LlmAuditEntry {
    pub fn success(
        provider: &str,
        model: &str,
        attempts: u32,
        data_class: &str,
        response: &LlmResponse,
        latency_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: provider.to_string(),
            model: response.model.clone(),
            attempts,
            outcome: AuditOutcome::Success,
            data_class: data_class.to_string(),
            prompt_tokens: response.prompt_tokens,
            completion_tokens: response.completion_tokens,
            output_hash: Some(output_hash(&response.content)),
            latency_ms,
            called_at: Utc::now(),
        }
        .with_model_fallback(model)
    }

    pub fn failure(
        provider: &str,
        model: &str,
        attempts: u32,
        data_class: &str,
        error: &LlmError,
        latency_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: provider.to_string(),
            model: model.to_string(),
            attempts,
            outcome: AuditOutcome::Failure { error: error.to_string() },
            data_class: data_class.to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
            output_hash: None,
            latency_ms,
            called_at: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == AuditOutcome::Success
    }

    fn with_model_fallback(mut self, model: &str) -> Self {
        if self.model.is_empty() {
            self.model = model.to_string();
        }
        self
    }
}

pub fn output_hash(output: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(output.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub calls: usize,
    pub failures: usize,
}

pub struct AuditLog {
    entries: Mutex<VecDeque<LlmAuditEntry>>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, entry: LlmAuditEntry) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LlmAuditEntry> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn provider_stats(&self) -> HashMap<String, ProviderStats> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let mut stats: HashMap<String, ProviderStats> = HashMap::new();
        for e in entries.iter() {
            let s = stats.entry(e.provider.clone()).or_default();
            s.calls += 1;
            if !e.succeeded() {
                s.failures += 1;
            }
        }
        stats
    }
}
