// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Durable SQLite-backed cache implementation

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use super::{types::TimestampMillis, CacheKey, ResponseCache};
use crate::errors::CacheError;

/// Durable response cache backed by a SQLite file
///
/// Entries persist across restarts. The schema stores only the key, the
/// serialized value, and the write timestamp; the per-entry read/write
/// counters of [`MemoryStore`](super::MemoryStore) are not tracked here.
///
/// Read failures are recovered locally: they are logged and reported as a
/// miss, never surfaced to the request being served.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the cache database at the given path
    ///
    /// Parent directories are created if missing, and `?mode=rwc` lets the
    /// first run start from an empty file. The schema migration runs once at
    /// connect time.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CacheError::connect(path.display().to_string(), e))?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .map_err(|e| CacheError::connect(path.display().to_string(), e))?;

        Self::migrate(&pool)
            .await
            .map_err(|e| CacheError::connect(path.display().to_string(), e))?;

        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS responses (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                written_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ResponseCache for SqliteStore {
    async fn get(&self, key: &CacheKey, max_age: Option<Duration>) -> Option<Value> {
        let row = sqlx::query_as::<_, (String, i64)>(
            "SELECT value, written_at FROM responses WHERE key = ?",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await;

        let (raw, written_at) = match row {
            Ok(Some(row)) => row,
            Ok(None) => {
                debug!(key = %key, "cache miss (sqlite)");
                return None;
            }
            Err(error) => {
                // Recovered locally: a failed read is a miss
                warn!(key = %key, error = %error, "cache read failed, treating as miss");
                return None;
            }
        };

        let written_at = TimestampMillis::from_millis(written_at.max(0) as u128);
        if let Some(max_age) = max_age {
            if written_at.is_older_than(max_age) {
                debug!(key = %key, age_ms = written_at.age_since_now().as_millis(), "cache entry stale");
                return None;
            }
        }

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key = %key, "cache hit (sqlite)");
                Some(value)
            }
            Err(error) => {
                warn!(key = %key, error = %error, "cached value is not valid JSON, treating as miss");
                None
            }
        }
    }

    async fn put(&self, key: CacheKey, value: Value) -> Result<(), CacheError> {
        let raw = value.to_string();
        let written_at = TimestampMillis::now().as_millis() as i64;

        sqlx::query(
            r#"
            INSERT INTO responses (key, value, written_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                written_at = excluded.written_at
            "#,
        )
        .bind(key.as_str())
        .bind(raw)
        .bind(written_at)
        .execute(&self.pool)
        .await
        .map_err(|e| CacheError::write_failed(key.as_str(), e))?;

        debug!(key = %key, "cache entry written (sqlite)");
        Ok(())
    }

    async fn len(&self) -> Option<usize> {
        match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM responses")
            .fetch_one(&self.pool)
            .await
        {
            Ok(count) => Some(count.max(0) as usize),
            Err(error) => {
                warn!(error = %error, "cache count query failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "SqliteStore"
    }
}
