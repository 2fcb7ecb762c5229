// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Process-lifetime request counters and the stats snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::cache::ResponseCache;

/// Monotonic counters for the request pipeline.
///
/// Counters only ever increase; they reset on process restart and never
/// otherwise. Increments use relaxed atomics: the counters are independent
/// and only read together when a snapshot is taken, so no ordering between
/// them is required.
#[derive(Debug, Default)]
pub struct StatsCollector {
    requests_total: AtomicU64,
    upstream_forwards: AtomicU64,
    cache_hits: AtomicU64,
}

impl StatsCollector {
    /// Creates a collector with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an inbound request
    pub fn record_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful forward to the upstream
    pub fn record_forward(&self) {
        self.upstream_forwards.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a served cache hit
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Produces a snapshot including the backend entry count
    pub async fn snapshot(&self, cache: &dyn ResponseCache) -> StatsSnapshot {
        StatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            upstream_forwards: self.upstream_forwards.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_entries: cache.len().await,
        }
    }

    /// Like [`snapshot`](Self::snapshot), but bounds the entry-count query
    ///
    /// Used on the shutdown path, where a durable backend's count query may
    /// not complete before process exit. On timeout the count is reported as
    /// absent; this is best-effort reporting, not a correctness requirement.
    pub async fn snapshot_with_timeout(
        &self,
        cache: &dyn ResponseCache,
        timeout: Duration,
    ) -> StatsSnapshot {
        let cache_entries = tokio::time::timeout(timeout, cache.len())
            .await
            .unwrap_or(None);
        StatsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            upstream_forwards: self.upstream_forwards.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_entries,
        }
    }
}

/// Point-in-time view of the counters, serializable for `/printstats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Total inbound requests handled
    pub requests_total: u64,
    /// Requests that reached the upstream and succeeded
    pub upstream_forwards: u64,
    /// Requests served from the cache
    pub cache_hits: u64,
    /// Entries currently in the cache backend, if the backend could answer
    pub cache_entries: Option<usize>,
}

impl StatsSnapshot {
    /// Calculates the cache hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        if self.requests_total == 0 {
            0.0
        } else {
            (self.cache_hits as f64 / self.requests_total as f64) * 100.0
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={}, forwards={}, cache_hits={}, cache_entries={}, hit_rate={:.1}%",
            self.requests_total,
            self.upstream_forwards,
            self.cache_hits,
            match self.cache_entries {
                Some(n) => n.to_string(),
                None => "unknown".to_string(),
            },
            self.hit_rate()
        )
    }
}
