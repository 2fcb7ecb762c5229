// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Environment configuration.
//!
//! Recognized variables (read after `.env` loading):
//!
//! - `RPC` (required) — upstream endpoint; the scheme selects HTTP proxy
//!   mode (`http`/`https`) or websocket relay mode (`ws`/`wss`)
//! - `PORT` — listen port, default 3000
//! - `CACHE_MAX_AGE` — TTL in seconds for volatile methods, default 10
//! - `CACHE_DB` — optional SQLite file path; presence selects the durable
//!   cache backing in place of the in-memory map

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::errors::ConfigError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;
/// Default TTL for volatile methods, in seconds.
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 10;

/// Which surface the proxy exposes, derived from the upstream URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenMode {
    /// JSON-RPC over HTTP with caching, throttling and retry
    Http,
    /// Raw bidirectional websocket relay, pure pass-through
    Websocket,
}

/// Runtime configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// The upstream endpoint
    pub rpc: Url,
    /// Serving mode, derived from the upstream scheme
    pub mode: ListenMode,
    /// Listen port
    pub port: u16,
    /// TTL applied to volatile methods
    pub cache_max_age: Duration,
    /// SQLite cache path; `None` selects the in-memory backing
    pub cache_db: Option<PathBuf>,
}

impl ProxyConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_rpc = std::env::var("RPC").map_err(|_| ConfigError::MissingRpc)?;
        let rpc: Url = raw_rpc
            .parse()
            .map_err(|e| ConfigError::invalid_rpc(&raw_rpc, e))?;
        let mode = mode_for(&rpc)?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid_number("PORT", raw, e))?,
            Err(_) => DEFAULT_PORT,
        };

        let cache_max_age = match std::env::var("CACHE_MAX_AGE") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|e| ConfigError::invalid_number("CACHE_MAX_AGE", raw, e))?,
            ),
            Err(_) => Duration::from_secs(DEFAULT_CACHE_MAX_AGE_SECS),
        };

        let cache_db = std::env::var("CACHE_DB").ok().map(PathBuf::from);

        Ok(Self {
            rpc,
            mode,
            port,
            cache_max_age,
            cache_db,
        })
    }
}

/// Derives the serving mode from the upstream URL scheme.
pub fn mode_for(rpc: &Url) -> Result<ListenMode, ConfigError> {
    match rpc.scheme() {
        "http" | "https" => Ok(ListenMode::Http),
        "ws" | "wss" => Ok(ListenMode::Websocket),
        other => Err(ConfigError::unsupported_scheme(other)),
    }
}
