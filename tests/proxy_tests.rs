// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the request-coordination pipeline
//!
//! These cover the end-to-end properties of the proxy: duplicate
//! suppression, TTL policy per method classification, null-sentinel safety,
//! retry exhaustion, and the hit/miss envelope contract.

mod helpers;

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use helpers::{coordinator, fast_dedup, fast_retry, mock_failing_upstream, mock_upstream, no_dedup, settle};
use rpcvalve::{RpcRequest, UpstreamError};

const TTL: Duration = Duration::from_secs(10);

/// Scenario: `eth_chainId` called twice in quick succession. Exactly one
/// call reaches the upstream; the duplicate is delayed into the dedup
/// window and then served from cache.
#[tokio::test]
async fn duplicate_burst_reaches_upstream_once() {
    let upstream = mock_upstream(json!("0x1"), 1).await;
    let proxy = coordinator(&upstream.uri(), TTL, fast_dedup(), fast_retry(3));

    let first = proxy
        .handle(RpcRequest::new("eth_chainId", Value::Null, json!(1)))
        .await
        .unwrap();
    assert!(!first.is_hit());

    let started = Instant::now();
    let second = proxy
        .handle(RpcRequest::new("eth_chainId", Value::Null, json!(2)))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    // Delayed by an amount in [min_delay, min_delay + max_extra)
    assert!(elapsed >= Duration::from_millis(150), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(400), "elapsed {elapsed:?}");

    // Served from cache, envelope rebuilt around the duplicate's own id
    assert!(second.is_hit());
    let body = second.into_body();
    assert_eq!(body["id"], json!(2));
    assert_eq!(body["result"], json!("0x1"));

    let snapshot = proxy.snapshot().await;
    assert_eq!(snapshot.requests_total, 2);
    assert_eq!(snapshot.upstream_forwards, 1);
    assert_eq!(snapshot.cache_hits, 1);
}

/// A concurrent burst of identical requests lands on a single upstream call;
/// every sibling resolves from the cached result.
#[tokio::test]
async fn concurrent_duplicates_are_throttled() {
    let upstream = mock_upstream(json!("0x1"), 1).await;
    let proxy = coordinator(&upstream.uri(), TTL, fast_dedup(), fast_retry(3));

    let request = |id: u64| proxy.handle(RpcRequest::new("eth_chainId", Value::Null, json!(id)));
    let (a, b, c, d) = tokio::join!(request(1), request(2), request(3), request(4));

    let responses = [a.unwrap(), b.unwrap(), c.unwrap(), d.unwrap()];
    let hits = responses.iter().filter(|r| r.is_hit()).count();
    assert_eq!(hits, 3, "exactly one request should reach the upstream");
    for response in responses {
        assert_eq!(response.into_body()["result"], json!("0x1"));
    }
}

/// Scenario: a volatile method with an expired TTL forces a fresh upstream
/// call.
#[tokio::test]
async fn volatile_ttl_expiry_forces_refetch() {
    let upstream = mock_upstream(json!("0x10d4f"), 2).await;
    let proxy = coordinator(
        &upstream.uri(),
        Duration::from_millis(100),
        no_dedup(),
        fast_retry(3),
    );

    let request = RpcRequest::new("eth_blockNumber", json!([]), json!(1));
    assert!(!proxy.handle(request.clone()).await.unwrap().is_hit());

    tokio::time::sleep(Duration::from_millis(300)).await;

    // Cache entry exists but is stale: goes upstream again
    assert!(!proxy.handle(request).await.unwrap().is_hit());
}

/// An always-immutable method serves from cache regardless of elapsed time
/// (verified at 10x the configured TTL).
#[tokio::test]
async fn immutable_method_ignores_volatile_ttl() {
    let upstream = mock_upstream(json!("0x1"), 1).await;
    let proxy = coordinator(
        &upstream.uri(),
        Duration::from_millis(50),
        no_dedup(),
        fast_retry(3),
    );

    let request = RpcRequest::new("eth_chainId", Value::Null, json!(1));
    proxy.handle(request.clone()).await.unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(proxy.handle(request).await.unwrap().is_hit());
}

/// Scenario: `eth_call` pinned by a blockHash parameter is
/// conditionally-immutable; the second identical call is a cache hit.
#[tokio::test]
async fn pinned_eth_call_is_immutable() {
    let upstream = mock_upstream(json!("0xreturndata"), 1).await;
    let proxy = coordinator(
        &upstream.uri(),
        Duration::from_millis(50),
        no_dedup(),
        fast_retry(3),
    );

    let params = json!([
        {"to": "0x6b175474e89094c44da98b954eedeac495271d0f", "data": "0x18160ddd"},
        {"blockHash": "0x1d59ff54b1eb26b013ce3cb5fc9dab3705b415a67127a003c3e61eb445bb8df2"}
    ]);
    let request = RpcRequest::new("eth_call", params, json!(1));

    proxy.handle(request.clone()).await.unwrap();
    settle().await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(proxy.handle(request).await.unwrap().is_hit());
}

/// The same call against `latest` stays volatile: once the TTL lapses it is
/// re-forwarded.
#[tokio::test]
async fn unpinned_eth_call_stays_volatile() {
    let upstream = mock_upstream(json!("0xreturndata"), 2).await;
    let proxy = coordinator(
        &upstream.uri(),
        Duration::from_millis(50),
        no_dedup(),
        fast_retry(3),
    );

    let params = json!([{"to": "0x1", "data": "0x18160ddd"}, "latest"]);
    let request = RpcRequest::new("eth_call", params, json!(1));

    proxy.handle(request.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!proxy.handle(request).await.unwrap().is_hit());
}

/// A null result (e.g., the receipt of an unmined transaction) is never
/// cached; the next call still hits the upstream.
#[tokio::test]
async fn null_result_is_never_a_cache_hit() {
    let upstream = mock_upstream(Value::Null, 2).await;
    let proxy = coordinator(&upstream.uri(), TTL, no_dedup(), fast_retry(3));

    let request = RpcRequest::new(
        "eth_getTransactionReceipt",
        json!(["0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b"]),
        json!(1),
    );

    assert!(!proxy.handle(request.clone()).await.unwrap().is_hit());
    settle().await;
    assert!(!proxy.handle(request).await.unwrap().is_hit());

    let snapshot = proxy.snapshot().await;
    assert_eq!(snapshot.cache_hits, 0);
    assert_eq!(snapshot.upstream_forwards, 2);
}

/// A value written via the cache-write path and read back within TTL is
/// identical to what was forwarded to the client.
#[tokio::test]
async fn cached_value_round_trips_identically() {
    let block = json!({
        "number": "0x10d4f",
        "hash": "0x1d59ff54b1eb26b013ce3cb5fc9dab3705b415a67127a003c3e61eb445bb8df2",
        "transactions": ["0xaa", "0xbb"],
    });
    let upstream = mock_upstream(block.clone(), 1).await;
    let proxy = coordinator(&upstream.uri(), TTL, no_dedup(), fast_retry(3));

    let request = RpcRequest::new(
        "eth_getBlockByHash",
        json!(["0x1d59ff54b1eb26b013ce3cb5fc9dab3705b415a67127a003c3e61eb445bb8df2", false]),
        json!(1),
    );

    let forwarded = proxy.handle(request.clone()).await.unwrap().into_body();
    assert_eq!(forwarded["result"], block);
    settle().await;

    let hit = proxy.handle(request).await.unwrap();
    assert!(hit.is_hit());
    assert_eq!(hit.into_body()["result"], block);
}

/// Scenario: the upstream answers every attempt with an error payload. The
/// client receives the final failure only after the whole attempt budget,
/// and the payload is surfaced verbatim.
#[tokio::test]
async fn error_payload_retried_until_exhaustion() {
    let upstream = mock_failing_upstream(3).await;
    let proxy = coordinator(&upstream.uri(), TTL, no_dedup(), fast_retry(3));

    let started = Instant::now();
    let failure = proxy
        .handle(RpcRequest::new("eth_blockNumber", json!([]), json!(1)))
        .await
        .unwrap_err();

    // Two backoff sleeps: 20ms + 40ms
    assert!(started.elapsed() >= Duration::from_millis(60));

    match failure {
        UpstreamError::ErrorPayload { body } => {
            assert_eq!(body["error"]["code"], json!(-32000));
        }
        other => panic!("expected ErrorPayload, got {other:?}"),
    }

    // Nothing cached, no forward counted
    let snapshot = proxy.snapshot().await;
    assert_eq!(snapshot.upstream_forwards, 0);
    assert_eq!(snapshot.cache_entries, Some(0));
}

/// Scenario: upstream unreachable for all attempts. The failure class is
/// `no_response` and the error surfaces only after retries.
#[tokio::test]
async fn unreachable_upstream_fails_after_retries() {
    // Nothing listens on this port
    let proxy = coordinator("http://127.0.0.1:9", TTL, no_dedup(), fast_retry(2));

    let failure = proxy
        .handle(RpcRequest::new("eth_chainId", Value::Null, json!(1)))
        .await
        .unwrap_err();

    assert_eq!(failure.class(), "no_response");
}

/// The miss path forwards the upstream body verbatim, including the
/// upstream's own id.
#[tokio::test]
async fn miss_path_forwards_upstream_body_verbatim() {
    // Mock upstream always answers with id 1 regardless of the request id
    let upstream = mock_upstream(json!("0x1"), 1).await;
    let proxy = coordinator(&upstream.uri(), TTL, no_dedup(), fast_retry(3));

    let body = proxy
        .handle(RpcRequest::new("eth_blockNumber", json!([]), json!(99)))
        .await
        .unwrap()
        .into_body();

    assert_eq!(body["id"], json!(1));
    assert_eq!(body["jsonrpc"], json!("2.0"));
}
