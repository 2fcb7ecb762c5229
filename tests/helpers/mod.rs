// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for rpcvalve integration tests
//!
//! Provides a mock JSON-RPC upstream and coordinator wiring with shortened
//! timing windows so tests run in milliseconds.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use rpcvalve::{
    DuplicateDetector, MemoryStore, MethodPolicy, RequestCoordinator, RetryConfig, UpstreamClient,
};

/// Starts a mock upstream that answers every POST with the given result
///
/// `expected_calls` is verified when the server drops, so tests assert how
/// many requests actually reached the upstream.
pub async fn mock_upstream(result: Value, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result,
        })))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

/// Starts a mock upstream that always answers with a JSON-RPC error payload
pub async fn mock_failing_upstream(expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "node overloaded" },
        })))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

/// A duplicate detector with a short, test-friendly delay range
pub fn fast_dedup() -> DuplicateDetector {
    DuplicateDetector::new()
        .with_trigger_threshold(Duration::from_secs(1))
        .with_min_delay(Duration::from_millis(150))
        .with_max_extra(Duration::from_millis(100))
}

/// A duplicate detector that never delays
pub fn no_dedup() -> DuplicateDetector {
    DuplicateDetector::new().with_trigger_threshold(Duration::ZERO)
}

/// A retry schedule short enough to exhaust within a test
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_backoff: Duration::from_millis(20),
    }
}

/// Wires a coordinator over an in-memory cache against the given upstream
pub fn coordinator(
    upstream_uri: &str,
    volatile_ttl: Duration,
    dedup: DuplicateDetector,
    retry: RetryConfig,
) -> Arc<RequestCoordinator> {
    let url = upstream_uri.parse().expect("valid upstream uri");
    let upstream = UpstreamClient::new(url).with_retry_config(retry);
    let policy = MethodPolicy::new(volatile_ttl);
    Arc::new(RequestCoordinator::new(Arc::new(MemoryStore::new()), upstream, policy).with_dedup(dedup))
}

/// Waits long enough for a fire-and-forget cache write to land
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
