// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Method classification and TTL policy.
//!
//! An RPC method's classification decides how long its cached responses stay
//! valid: immutable results never expire, while anything tied to chain state
//! that can still move is bounded by the configured volatile TTL.

use serde_json::Value;
use std::time::Duration;

/// Default TTL for volatile methods, in seconds.
pub const DEFAULT_VOLATILE_TTL_SECS: u64 = 10;

/// Classification of an RPC method for caching purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodClass {
    /// The response can never change (e.g., `eth_chainId`, lookups by block
    /// hash). Infinite TTL.
    AlwaysImmutable,
    /// Immutable only when the parameters pin an explicit block reference
    /// (a hex quantity or a `blockHash`), as opposed to a moving tag like
    /// `latest`. Otherwise bounded by the volatile TTL.
    PinnedByParams,
    /// Lookups keyed by transaction hash whose result, once non-null, never
    /// changes (receipts and mined transactions). Infinite TTL; the
    /// cache-write predicate already rejects the null "not yet mined" case.
    ReceiptStyle,
    /// Everything else. Bounded by the configured volatile TTL.
    Volatile,
}

/// Resolves per-method cache TTLs and the cache-write predicate.
#[derive(Debug, Clone)]
pub struct MethodPolicy {
    volatile_ttl: Duration,
}

impl MethodPolicy {
    /// Creates a policy with the given TTL for volatile methods
    pub fn new(volatile_ttl: Duration) -> Self {
        Self { volatile_ttl }
    }

    /// Classifies a method by name alone
    pub fn classify(method: &str) -> MethodClass {
        match method {
            "eth_chainId"
            | "net_version"
            | "eth_getBlockByHash"
            | "eth_getTransactionByBlockHashAndIndex"
            | "eth_getBlockTransactionCountByHash"
            | "eth_getUncleByBlockHashAndIndex"
            | "eth_getUncleCountByBlockHash" => MethodClass::AlwaysImmutable,

            "eth_call"
            | "eth_getBalance"
            | "eth_getCode"
            | "eth_getStorageAt"
            | "eth_getTransactionCount"
            | "eth_getBlockByNumber"
            | "eth_getLogs" => MethodClass::PinnedByParams,

            "eth_getTransactionReceipt" | "eth_getTransactionByHash" => MethodClass::ReceiptStyle,

            _ => MethodClass::Volatile,
        }
    }

    /// Returns the maximum age for a cached response to this call
    ///
    /// `None` means unbounded (the response is immutable).
    pub fn max_age(&self, method: &str, params: &Value) -> Option<Duration> {
        match Self::classify(method) {
            MethodClass::AlwaysImmutable | MethodClass::ReceiptStyle => None,
            MethodClass::PinnedByParams => {
                if params_pin_block(method, params) {
                    None
                } else {
                    Some(self.volatile_ttl)
                }
            }
            MethodClass::Volatile => Some(self.volatile_ttl),
        }
    }

    /// Decides whether a successful upstream result should be written back
    ///
    /// A `null` result is never cached: a legitimately-pending value (e.g.,
    /// the receipt of an unmined transaction) must not be remembered as
    /// permanently absent.
    pub fn should_cache(&self, result: &Value) -> bool {
        !result.is_null()
    }
}

impl Default for MethodPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_VOLATILE_TTL_SECS))
    }
}

/// Checks whether the call parameters pin an explicit block reference.
fn params_pin_block(method: &str, params: &Value) -> bool {
    let Some(params) = params.as_array() else {
        return false;
    };

    match method {
        // Filter object: pinned iff a blockHash is given, or both ends of
        // the range are explicit quantities.
        "eth_getLogs" => params.first().is_some_and(|filter| {
            filter.get("blockHash").is_some_and(is_block_hash_ref)
                || (filter.get("fromBlock").is_some_and(is_hex_quantity)
                    && filter.get("toBlock").is_some_and(is_hex_quantity))
        }),

        // The block tag is the first parameter (the second is the
        // full-transactions flag).
        "eth_getBlockByNumber" => params.first().is_some_and(is_pinned_block_ref),

        // State queries carry the block tag as their last parameter.
        _ => params.last().is_some_and(is_pinned_block_ref),
    }
}

/// A block reference is pinned when it is an explicit hex quantity or an
/// EIP-1898 object carrying a `blockHash` or explicit `blockNumber`.
fn is_pinned_block_ref(value: &Value) -> bool {
    match value {
        Value::String(_) => is_hex_quantity(value),
        Value::Object(map) => {
            map.get("blockHash").is_some_and(is_block_hash_ref)
                || map.get("blockNumber").is_some_and(is_hex_quantity)
        }
        _ => false,
    }
}

fn is_hex_quantity(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.starts_with("0x") && s.len() > 2)
}

fn is_block_hash_ref(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.starts_with("0x"))
}
