//! Prediction history, keyed by user id.
//!
//! Writes go to a bounded in-memory cache and then to SQLite when a database
//! is configured. The cache keeps at most `max_per_user` entries per user and
//! at most `max_users` users; a new user arriving at capacity evicts the user
//! written least recently. Evicted users are still served from the database.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use cardiosense_common::{HistoryConfig, PatientInput, RiskLevel};

use crate::history_db::SqliteHistory;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub input: PatientInput,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence: f64,
}

struct CachedUser {
    entries: VecDeque<HistoryEntry>,
    last_write: u64,
}

#[derive(Default)]
struct UserCache {
    users: HashMap<String, CachedUser>,
    clock: u64,
}

impl UserCache {
    fn push(&mut self, entry: HistoryEntry, max_per_user: usize, max_users: usize) {
        self.clock += 1;
        if !self.users.contains_key(&entry.user_id) && self.users.len() >= max_users {
            // Linear scan; only runs when a new user arrives at capacity
            let oldest = self
                .users
                .iter()
                .min_by_key(|(_, user)| user.last_write)
                .map(|(id, _)| id.clone());
            if let Some(id) = oldest {
                self.users.remove(&id);
            }
        }

        let user = self
            .users
            .entry(entry.user_id.clone())
            .or_insert_with(|| CachedUser { entries: VecDeque::new(), last_write: 0 });
        user.last_write = self.clock;
        user.entries.push_front(entry);
        user.entries.truncate(max_per_user);
    }
}

pub struct HistoryStore {
    cache: RwLock<UserCache>,
    db: Option<SqliteHistory>,
    max_per_user: usize,
    max_users: usize,
}

impl HistoryStore {
    /// History that lives only as long as the process.
    pub fn in_memory(max_per_user: usize, max_users: usize) -> Self {
        Self {
            cache: RwLock::new(UserCache::default()),
            db: None,
            max_per_user: max_per_user.max(1),
            max_users: max_users.max(1),
        }
    }

    pub fn with_database(db: SqliteHistory, max_per_user: usize, max_users: usize) -> Self {
        Self { db: Some(db), ..Self::in_memory(max_per_user, max_users) }
    }

    /// Build the store described by `[history]`; an empty `database_url`
    /// disables persistence.
    pub async fn from_config(config: &HistoryConfig) -> anyhow::Result<Self> {
        let url = config.database_url.trim();
        if url.is_empty() {
            info!("Prediction history kept in memory only");
            return Ok(Self::in_memory(config.max_per_user, config.max_users));
        }

        let db = SqliteHistory::connect(url, config.max_per_user).await?;
        info!(url, "Prediction history database ready");
        Ok(Self::with_database(db, config.max_per_user, config.max_users))
    }

    pub fn is_persistent(&self) -> bool {
        self.db.is_some()
    }

    /// Cache first, then the database. A database failure is returned after
    /// the entry is already visible in memory.
    pub async fn record(&self, entry: HistoryEntry) -> anyhow::Result<()> {
        {
            let mut cache = self.cache.write().unwrap_or_else(|p| p.into_inner());
            cache.push(entry.clone(), self.max_per_user, self.max_users);
        }
        if let Some(db) = &self.db {
            db.insert(&entry).await?;
        }
        Ok(())
    }

    /// Up to `limit` entries for `user_id`, newest first.
    ///
    /// The cache always holds a user's newest entries, so the database is
    /// only read when the cache has fewer than `limit`.
    pub async fn recent(&self, user_id: &str, limit: usize) -> anyhow::Result<Vec<HistoryEntry>> {
        let cached: Vec<HistoryEntry> = {
            let cache = self.cache.read().unwrap_or_else(|p| p.into_inner());
            cache
                .users
                .get(user_id)
                .map(|user| user.entries.iter().take(limit).cloned().collect())
                .unwrap_or_default()
        };

        let Some(db) = &self.db else {
            return Ok(cached);
        };
        if cached.len() >= limit {
            return Ok(cached);
        }

        let stored = db.recent(user_id, limit).await?;
        Ok(merge_newest(cached, stored, limit))
    }

    /// Entries held in memory.
    pub fn total(&self) -> usize {
        let cache = self.cache.read().unwrap_or_else(|p| p.into_inner());
        cache.users.values().map(|user| user.entries.len()).sum()
    }

    /// Users held in memory.
    pub fn user_count(&self) -> usize {
        self.cache.read().unwrap_or_else(|p| p.into_inner()).users.len()
    }
}

/// Union by id, newest first. Cached copies win over stored ones.
fn merge_newest(cached: Vec<HistoryEntry>, stored: Vec<HistoryEntry>, limit: usize) -> Vec<HistoryEntry> {
    let mut seen: HashSet<Uuid> = cached.iter().map(|e| e.id).collect();
    let mut merged = cached;
    merged.extend(stored.into_iter().filter(|e| seen.insert(e.id)));
    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged.truncate(limit);
    merged
}
