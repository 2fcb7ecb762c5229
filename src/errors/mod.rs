//! Error types for the rpcvalve library.
//!
//! This module provides strongly-typed errors for all public APIs in
//! rpcvalve. It follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained error handling
//!   ([`CacheError`], [`UpstreamError`], [`ConfigError`], [`RelayError`])
//! - **Unified error type** ([`ValveError`]) for convenience when you don't
//!   need to distinguish between error sources
//!
//! # Examples
//!
//! ```rust,ignore
//! use rpcvalve::{UpstreamClient, UpstreamError};
//!
//! match client.call(&payload).await {
//!     Ok(body) => println!("response: {body}"),
//!     Err(UpstreamError::ErrorPayload { body }) => {
//!         eprintln!("remote error: {body}");
//!     }
//!     Err(e) => eprintln!("upstream unreachable: {e}"),
//! }
//! ```

mod cache;
mod config;
mod relay;
mod upstream;

pub use cache::CacheError;
pub use config::ConfigError;
pub use relay::RelayError;
pub use upstream::UpstreamError;

/// Unified error type for all rpcvalve operations.
///
/// This enum wraps all module-specific error types, providing a convenient
/// way to handle errors when you don't need to distinguish between different
/// error sources. All module-specific error types automatically convert to
/// `ValveError` via `From` implementations, so you can use `?` to propagate
/// errors naturally.
#[derive(Debug, thiserror::Error)]
pub enum ValveError {
    /// Error from a cache backend.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from the upstream JSON-RPC endpoint.
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Error loading configuration from the environment.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the websocket relay.
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
}
