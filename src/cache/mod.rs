//! Cache backends for JSON-RPC responses
//!
//! This module provides the storage behind the request coordinator:
//!
//! - [`MemoryStore`]: in-memory map with per-entry read/write bookkeeping
//! - [`SqliteStore`]: durable SQLite-backed store that survives restarts
//!
//! Exactly one backing is active at a time, selected at startup from
//! configuration and held as an `Arc<dyn ResponseCache>`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use rpcvalve::{MemoryStore, SqliteStore, ResponseCache};
//! use std::sync::Arc;
//!
//! // In-memory backing (no persistence)
//! let cache: Arc<dyn ResponseCache> = Arc::new(MemoryStore::new());
//!
//! // Durable backing (persists across restarts)
//! let cache: Arc<dyn ResponseCache> = Arc::new(SqliteStore::connect("cache.db").await?);
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

use crate::errors::CacheError;

mod memory;
mod sqlite;
pub mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::TimestampMillis;

/// Key identifying a cacheable JSON-RPC call
///
/// Derived from the method name and the serialized parameter list. The
/// serialization is canonical for equal parameter structures: serde_json
/// keeps object members in a sorted map, so two requests whose params differ
/// only in member order produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Creates a cache key from a method name and its params
    ///
    /// Absent params serialize as `null`, so `{"method":"eth_chainId"}` and
    /// `{"method":"eth_chainId","params":null}` share a key.
    pub fn new(method: &str, params: &Value) -> Self {
        Self(format!("{method}:{params}"))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for response cache backends
///
/// Implementations provide different storage strategies for cached JSON-RPC
/// results. All operations are async to support both in-memory and durable
/// backends.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and support concurrent access. Use
/// interior mutability (e.g., `Mutex`) as needed.
///
/// # Error Handling
///
/// Cache reads must not fail the request being served. If a read fails,
/// implementations log the error and report a miss. Write errors are
/// surfaced to the caller, which logs and drops them (caching is
/// best-effort).
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Retrieves a cached value for the given key
    ///
    /// `max_age` bounds how old the entry may be; `None` means unbounded.
    /// An entry is valid iff `now - written_at <= max_age`.
    ///
    /// Returns `None` if:
    /// - the key is not in the cache
    /// - the entry is older than `max_age`
    /// - a read error occurred (logged internally)
    ///
    /// Stale entries are not removed; they stay until the next overwrite.
    async fn get(&self, key: &CacheKey, max_age: Option<Duration>) -> Option<Value>;

    /// Writes a value for the given key
    ///
    /// Unconditionally overwrites any prior entry, bumping its write count
    /// and refreshing `written_at`.
    async fn put(&self, key: CacheKey, value: Value) -> Result<(), CacheError>;

    /// Returns the current number of entries, for the stats snapshot
    ///
    /// `None` when the backend cannot answer (e.g., the durable count query
    /// failed).
    async fn len(&self) -> Option<usize>;

    /// Returns a human-readable name for this backend
    ///
    /// Used for startup logging and debugging.
    fn name(&self) -> &'static str;
}
