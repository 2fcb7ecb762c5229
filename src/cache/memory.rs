// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory cache implementation with per-entry bookkeeping

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{types::TimestampMillis, CacheKey, ResponseCache};
use crate::errors::CacheError;

/// Entry in the memory store with metadata
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The cached JSON-RPC result
    value: Value,
    /// When this entry was last written
    written_at: TimestampMillis,
    /// Number of served cache hits for this entry
    read_count: u64,
    /// Number of writes to this key, including the initial one
    write_count: u64,
}

impl CacheEntry {
    fn new(value: Value) -> Self {
        Self {
            value,
            written_at: TimestampMillis::now(),
            read_count: 0,
            write_count: 1,
        }
    }

    fn is_fresh(&self, max_age: Option<Duration>) -> bool {
        match max_age {
            Some(max_age) => !self.written_at.is_older_than(max_age),
            None => true,
        }
    }
}

/// In-memory response cache
///
/// Stores results in a HashMap guarded by an async mutex. Entries are never
/// evicted: a stale entry is skipped on read and replaced on the next write,
/// and the map grows with the number of distinct method+params combinations
/// seen over the process lifetime.
///
/// Unlike [`SqliteStore`](super::SqliteStore), this backing tracks per-entry
/// read and write counts; it trades persistence for that instrumentation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryStore {
    /// Creates a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn counts(&self, key: &CacheKey) -> Option<(u64, u64)> {
        let entries = self.entries.lock().await;
        entries.get(key).map(|e| (e.read_count, e.write_count))
    }
}

#[async_trait]
impl ResponseCache for MemoryStore {
    async fn get(&self, key: &CacheKey, max_age: Option<Duration>) -> Option<Value> {
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "cache miss (memory)");
            return None;
        };

        if !entry.is_fresh(max_age) {
            debug!(key = %key, age_ms = entry.written_at.age_since_now().as_millis(), "cache entry stale");
            return None;
        }

        // A null sentinel is never served as a hit, so it does not count
        if !entry.value.is_null() {
            entry.read_count += 1;
            debug!(key = %key, reads = entry.read_count, "cache hit (memory)");
        }
        Some(entry.value.clone())
    }

    async fn put(&self, key: CacheKey, value: Value) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;

        match entries.get_mut(&key) {
            Some(entry) => {
                entry.value = value;
                entry.written_at = TimestampMillis::now();
                entry.write_count += 1;
                debug!(key = %key, writes = entry.write_count, "cache entry overwritten");
            }
            None => {
                debug!(key = %key, "cache entry created");
                entries.insert(key, CacheEntry::new(value));
            }
        }

        Ok(())
    }

    async fn len(&self) -> Option<usize> {
        Some(self.entries.lock().await.len())
    }

    fn name(&self) -> &'static str {
        "MemoryStore"
    }
}
