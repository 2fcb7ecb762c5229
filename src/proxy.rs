// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! The per-request coordination pipeline.
//!
//! [`RequestCoordinator`] owns the cache, the duplicate detector, the
//! upstream client, and the counters, and runs each inbound request through
//! them: key → duplicate delay → policy max-age → cache probe → upstream
//! call → fire-and-forget cache write.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::dedup::DuplicateDetector;
use crate::errors::UpstreamError;
use crate::policy::MethodPolicy;
use crate::stats::{StatsCollector, StatsSnapshot};
use crate::upstream::UpstreamClient;

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

/// Inbound JSON-RPC request object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Protocol version; defaults to "2.0" when absent
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    /// The RPC method name
    pub method: String,
    /// Call parameters; absent params are treated as `null`
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
    /// Request identifier, echoed back on the cache-hit path
    #[serde(default)]
    pub id: Value,
}

impl RpcRequest {
    /// Creates a request with the given method, params and id
    pub fn new(method: impl Into<String>, params: Value, id: Value) -> Self {
        Self {
            jsonrpc: default_jsonrpc(),
            method: method.into(),
            params,
            id,
        }
    }

    fn to_payload(&self) -> Value {
        let mut payload = json!({
            "jsonrpc": self.jsonrpc,
            "method": self.method,
            "id": self.id,
        });
        if !self.params.is_null() {
            payload["params"] = self.params.clone();
        }
        payload
    }
}

/// Outcome of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyResponse {
    /// Served from cache: an envelope rebuilt around the original request id
    Hit(Value),
    /// Served from upstream: the response body, forwarded unmodified
    Forwarded(Value),
}

impl ProxyResponse {
    /// Consumes the response, returning the body to send to the client
    pub fn into_body(self) -> Value {
        match self {
            ProxyResponse::Hit(body) | ProxyResponse::Forwarded(body) => body,
        }
    }

    /// Whether this response was served from cache
    pub fn is_hit(&self) -> bool {
        matches!(self, ProxyResponse::Hit(_))
    }
}

/// Orchestrates the request pipeline and owns all shared state.
///
/// Built once at startup and shared via `Arc`; there are no process-wide
/// bindings. Each request runs as its own task and may suspend (duplicate
/// delay, durable read, upstream call) without blocking other in-flight
/// requests.
pub struct RequestCoordinator {
    cache: Arc<dyn ResponseCache>,
    dedup: DuplicateDetector,
    upstream: UpstreamClient,
    policy: MethodPolicy,
    stats: StatsCollector,
}

impl RequestCoordinator {
    /// Creates a coordinator over the given cache backing and upstream
    pub fn new(cache: Arc<dyn ResponseCache>, upstream: UpstreamClient, policy: MethodPolicy) -> Self {
        Self {
            cache,
            dedup: DuplicateDetector::new(),
            upstream,
            policy,
            stats: StatsCollector::new(),
        }
    }

    /// Replaces the duplicate detector (tests use shortened windows)
    pub fn with_dedup(mut self, dedup: DuplicateDetector) -> Self {
        self.dedup = dedup;
        self
    }

    /// Returns the name of the active cache backend
    pub fn cache_name(&self) -> &'static str {
        self.cache.name()
    }

    /// Handles one inbound request end to end
    ///
    /// On a cache hit the response envelope reuses the *original* request's
    /// id. On a miss the upstream body is forwarded unmodified, and the
    /// result is written back to the cache in a spawned task, after the
    /// response is already on its way to the caller. A client's immediate
    /// duplicate may therefore race the cache population; the duplicate
    /// detector's throttle bounds that window.
    pub async fn handle(&self, request: RpcRequest) -> Result<ProxyResponse, UpstreamError> {
        self.stats.record_request();
        let key = CacheKey::new(&request.method, &request.params);

        if let Some(delay) = self.dedup.should_delay(&key).await {
            debug!(method = %request.method, delay_ms = delay.as_millis(), "throttling duplicate request");
            tokio::time::sleep(delay).await;
        }

        let max_age = self.policy.max_age(&request.method, &request.params);
        if let Some(cached) = self.cache.get(&key, max_age).await {
            // A cached null is a sentinel, never a servable hit
            if !cached.is_null() {
                self.stats.record_cache_hit();
                debug!(method = %request.method, "serving from cache");
                let envelope = json!({
                    "jsonrpc": "2.0",
                    "id": request.id,
                    "result": cached,
                });
                return Ok(ProxyResponse::Hit(envelope));
            }
        }

        let body = self.upstream.call(&request.to_payload()).await?;
        self.stats.record_forward();

        if let Some(upstream_id) = body.get("id") {
            if *upstream_id != request.id {
                warn!(
                    method = %request.method,
                    request_id = %request.id,
                    upstream_id = %upstream_id,
                    "upstream response id differs from request id"
                );
            }
        }

        if let Some(result) = body.get("result") {
            if self.policy.should_cache(result) {
                let cache = Arc::clone(&self.cache);
                let value = result.clone();
                // Fire-and-forget: the response does not wait for the write
                tokio::spawn(async move {
                    if let Err(error) = cache.put(key, value).await {
                        warn!(error = %error, "cache write failed, entry lost");
                    }
                });
            }
        }

        Ok(ProxyResponse::Forwarded(body))
    }

    /// Produces a stats snapshot, querying the backend entry count
    pub async fn snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(self.cache.as_ref()).await
    }

    /// Shutdown-path snapshot with a bounded entry-count query
    pub async fn shutdown_snapshot(&self, timeout: Duration) -> StatsSnapshot {
        self.stats
            .snapshot_with_timeout(self.cache.as_ref(), timeout)
            .await
    }
}
