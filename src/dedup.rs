// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Duplicate-request detection with randomized throttling.
//!
//! Bursts of identical requests are each delayed by a random amount so the
//! first request's result has time to populate the cache before the
//! duplicates probe it. This is a best-effort throttle, not a coalescing
//! queue: it trades a strict single-flight guarantee for lock-free-simple
//! bookkeeping.

use rand::Rng;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{CacheKey, TimestampMillis};

/// Default window within which identical requests count as duplicates (1s).
const DEFAULT_TRIGGER_THRESHOLD_MS: u64 = 1000;
/// Default minimum delay applied to a detected duplicate (500ms).
const DEFAULT_MIN_DELAY_MS: u64 = 500;
/// Default width of the random extra delay (delays land in [min, min+extra)).
const DEFAULT_MAX_EXTRA_MS: u64 = 1000;

/// Tracks the last-seen time per request key and throttles duplicates.
///
/// A request whose key was seen less than the trigger threshold ago is
/// delayed by a duration drawn uniformly from `[min_delay, min_delay +
/// max_extra)`. The last-seen record is updated *before* any delay elapses,
/// so concurrent duplicates arriving in the same tick all observe the same
/// pending timestamp and are throttled uniformly.
///
/// The map has no eviction: it grows by one entry per distinct method+params
/// combination over the process lifetime. That is acceptable for short-lived
/// processes and a known trade-off for long-running ones.
///
/// Known race: two requests for the same key arriving before either has
/// updated the record may both pass through undelayed. Correctness does not
/// depend on the throttle; the cache freshness test does the real work.
#[derive(Debug)]
pub struct DuplicateDetector {
    trigger_threshold: Duration,
    min_delay: Duration,
    max_extra: Duration,
    seen: Mutex<HashMap<CacheKey, TimestampMillis>>,
}

impl DuplicateDetector {
    /// Creates a detector with the default window and delay range
    pub fn new() -> Self {
        Self {
            trigger_threshold: Duration::from_millis(DEFAULT_TRIGGER_THRESHOLD_MS),
            min_delay: Duration::from_millis(DEFAULT_MIN_DELAY_MS),
            max_extra: Duration::from_millis(DEFAULT_MAX_EXTRA_MS),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the window within which identical requests count as duplicates
    pub fn with_trigger_threshold(mut self, threshold: Duration) -> Self {
        self.trigger_threshold = threshold;
        self
    }

    /// Sets the minimum delay applied to a detected duplicate
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Sets the width of the random extra delay
    ///
    /// Delays are drawn uniformly from `[min_delay, min_delay + max_extra)`.
    pub fn with_max_extra(mut self, max_extra: Duration) -> Self {
        self.max_extra = max_extra;
        self
    }

    /// Decides whether the request for `key` should be delayed
    ///
    /// Returns the delay to apply, or `None` if the request may proceed
    /// immediately. The last-seen record for `key` is refreshed on every
    /// call, delayed or not, before this method returns.
    pub async fn should_delay(&self, key: &CacheKey) -> Option<Duration> {
        let now = TimestampMillis::now();
        let previous = {
            let mut seen = self.seen.lock().await;
            seen.insert(key.clone(), now)
        };

        let last_seen = previous?;
        if last_seen.age_since_now() >= self.trigger_threshold {
            return None;
        }

        let extra_ms = self.max_extra.as_millis() as u64;
        let extra = if extra_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..extra_ms))
        };
        let delay = self.min_delay + extra;
        debug!(key = %key, delay_ms = delay.as_millis(), "duplicate burst detected");
        Some(delay)
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}
