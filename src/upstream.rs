// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Resilient upstream JSON-RPC client with exponential-backoff retry.
//!
//! Every failure class (error payload, no response, unclassified body) is
//! retried identically until the attempt budget is spent. The backoff
//! formula is:
//!
//! ```text
//! delay = initial_backoff * 2^failure_index
//! ```

use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::errors::UpstreamError;

/// Default maximum number of attempts, the initial call included.
const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default delay before the first retry (2s; subsequent retries double it).
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 2000;

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of attempts, the initial call included.
    pub max_attempts: u32,
    /// Delay before the first retry; each further retry doubles it.
    pub initial_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
        }
    }
}

/// JSON-RPC client that forwards payloads verbatim and retries failures.
///
/// The payload is opaque to the client: it is posted as-is and the response
/// body is returned as-is. Failures are classified for diagnostics only
/// (see [`UpstreamError`]); classification does not change retry
/// eligibility.
///
/// # Example
///
/// ```rust,ignore
/// use rpcvalve::{RetryConfig, UpstreamClient};
/// use std::time::Duration;
///
/// let client = UpstreamClient::new(rpc_url).with_retry_config(RetryConfig {
///     max_attempts: 5,
///     initial_backoff: Duration::from_millis(500),
/// });
/// let body = client.call(&payload).await?;
/// ```
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: Url,
    config: RetryConfig,
}

impl UpstreamClient {
    /// Creates a client for the given upstream URL with default retry
    /// settings (10 attempts, 2s initial backoff)
    pub fn new(url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            config: RetryConfig::default(),
        }
    }

    /// Replaces the retry configuration
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the upstream URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Calls the upstream, retrying failures with exponential backoff
    ///
    /// The loop is iterative with an explicit attempt counter. On
    /// exhaustion the last observed failure is returned verbatim; no
    /// failure is silently swallowed.
    pub async fn call(&self, payload: &Value) -> Result<Value, UpstreamError> {
        let method = payload
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut failures = 0u32;
        loop {
            match self.attempt(payload).await {
                Ok(body) => {
                    if failures > 0 {
                        debug!(method, attempts = failures + 1, "upstream call succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(error) => {
                    failures += 1;
                    if failures >= self.config.max_attempts {
                        warn!(
                            method,
                            error = %error,
                            class = error.class(),
                            attempts = failures,
                            "upstream attempts exhausted"
                        );
                        return Err(error);
                    }

                    let delay = backoff_delay(failures - 1, self.config.initial_backoff);
                    warn!(
                        method,
                        error = %error,
                        class = error.class(),
                        attempt = failures,
                        max_attempts = self.config.max_attempts,
                        delay_ms = delay.as_millis(),
                        "upstream call failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(&self, payload: &Value) -> Result<Value, UpstreamError> {
        let response = self
            .http
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(UpstreamError::no_response)?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::malformed("response body is not JSON", e))?;

        // A JSON-RPC error payload counts as a failure and is retried like
        // a transport error; the full body is kept for verbatim surfacing.
        if body.get("error").is_some_and(|e| !e.is_null()) {
            return Err(UpstreamError::error_payload(body));
        }

        Ok(body)
    }
}

/// Calculates the backoff delay after `failure_index` observed failures.
///
/// Doubles on every failure, saturating rather than overflowing:
/// `initial * 2^failure_index`.
pub fn backoff_delay(failure_index: u32, initial: Duration) -> Duration {
    let multiplier = 2u64.saturating_pow(failure_index);
    let delay_ms = (initial.as_millis() as u64).saturating_mul(multiplier);
    Duration::from_millis(delay_ms)
}
