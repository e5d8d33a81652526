//! SQLite persistence for prediction history.
//!
//! One row per recorded prediction. Each insert prunes the user's rows
//! beyond `max_per_user`, so the table is bounded the same way as the
//! in-memory cache.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use cardiosense_common::RiskLevel;

use crate::history::HistoryEntry;

/// SQLite-backed history table.
#[derive(Clone)]
pub struct SqliteHistory {
    pool: SqlitePool,
    max_per_user: usize,
}

impl SqliteHistory {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    pub async fn connect(url: &str, max_per_user: usize) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid history database URL: {url}"))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open history database: {url}"))?;
        Self::with_pool(pool, max_per_user).await
    }

    /// Private in-memory database. It lives as long as its single connection,
    /// so the pool never lets that connection expire.
    pub async fn in_memory(max_per_user: usize) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .context("Invalid in-memory database URL")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory history database")?;
        Self::with_pool(pool, max_per_user).await
    }

    async fn with_pool(pool: SqlitePool, max_per_user: usize) -> Result<Self> {
        let db = Self { pool, max_per_user: max_per_user.max(1) };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS predictions (
                id           TEXT PRIMARY KEY,
                user_id      TEXT NOT NULL,
                timestamp_us INTEGER NOT NULL,
                input        TEXT NOT NULL,
                risk_score   REAL NOT NULL,
                risk_level   TEXT NOT NULL,
                confidence   REAL NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create predictions table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_predictions_user_time \
             ON predictions (user_id, timestamp_us DESC)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create predictions index")?;

        Ok(())
    }

    pub async fn insert(&self, entry: &HistoryEntry) -> Result<()> {
        let input = serde_json::to_string(&entry.input).context("Failed to encode patient input")?;

        sqlx::query(
            r#"
            INSERT INTO predictions
                (id, user_id, timestamp_us, input, risk_score, risk_level, confidence)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(entry.id.to_string())
        .bind(&entry.user_id)
        .bind(entry.timestamp.timestamp_micros())
        .bind(input)
        .bind(entry.risk_score)
        .bind(entry.risk_level.as_str())
        .bind(entry.confidence)
        .execute(&self.pool)
        .await
        .context("Failed to insert prediction")?;

        sqlx::query(
            r#"
            DELETE FROM predictions
            WHERE user_id = ?
              AND rowid NOT IN (
                  SELECT rowid FROM predictions
                  WHERE user_id = ?
                  ORDER BY timestamp_us DESC, rowid DESC
                  LIMIT ?
              )
            "#,
        )
        .bind(&entry.user_id)
        .bind(&entry.user_id)
        .bind(i64::try_from(self.max_per_user).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await
        .context("Failed to prune prediction history")?;

        Ok(())
    }

    /// Up to `limit` rows for `user_id`, newest first.
    pub async fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, user_id, timestamp_us, input, risk_score, risk_level, confidence
            FROM predictions
            WHERE user_id = ?
            ORDER BY timestamp_us DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch prediction history")?;

        rows.into_iter().map(HistoryEntry::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    user_id: String,
    timestamp_us: i64,
    input: String,
    risk_score: f64,
    risk_level: String,
    confidence: f64,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = anyhow::Error;

    fn try_from(row: HistoryRow) -> Result<Self> {
        Ok(HistoryEntry {
            id: Uuid::parse_str(&row.id).with_context(|| format!("Corrupt prediction id: {}", row.id))?,
            timestamp: DateTime::<Utc>::from_timestamp_micros(row.timestamp_us)
                .with_context(|| format!("Corrupt timestamp on prediction {}", row.id))?,
            input: serde_json::from_str(&row.input)
                .with_context(|| format!("Corrupt patient input on prediction {}", row.id))?,
            risk_level: RiskLevel::from_str(&row.risk_level).map_err(anyhow::Error::msg)?,
            user_id: row.user_id,
            risk_score: row.risk_score,
            confidence: row.confidence,
        })
    }
}
