//! Error types for the upstream JSON-RPC client.

use serde_json::{json, Value};

/// Failure observed while calling the upstream endpoint.
///
/// The classification is for diagnostics only: every variant is retried
/// identically until the attempt budget is spent, and on exhaustion the last
/// observed failure is surfaced verbatim.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The upstream answered with a JSON-RPC error payload.
    ///
    /// The full response body is kept so it can be forwarded to the client
    /// unmodified after retries are exhausted.
    #[error("Upstream returned an error payload")]
    ErrorPayload {
        /// The complete upstream response body, `error` member included
        body: Value,
    },

    /// No response was received (connection failure, timeout, reset).
    #[error("No response from upstream")]
    NoResponse {
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A response arrived but could not be classified as a JSON-RPC body.
    #[error("Unclassified upstream response: {details}")]
    Malformed {
        /// Description of what was wrong with the response
        details: String,
        /// The underlying decode error, if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl UpstreamError {
    /// Helper to create an `ErrorPayload` error from a response body.
    pub fn error_payload(body: Value) -> Self {
        UpstreamError::ErrorPayload { body }
    }

    /// Helper to create a `NoResponse` error from any error type.
    pub fn no_response(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        UpstreamError::NoResponse {
            source: Box::new(source),
        }
    }

    /// Helper to create a `Malformed` error from any error type.
    pub fn malformed(
        details: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        UpstreamError::Malformed {
            details: details.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short label for the failure class, used as a structured log field.
    pub fn class(&self) -> &'static str {
        match self {
            UpstreamError::ErrorPayload { .. } => "error_payload",
            UpstreamError::NoResponse { .. } => "no_response",
            UpstreamError::Malformed { .. } => "malformed",
        }
    }

    /// Serializes the failure for the client-facing error response.
    ///
    /// An upstream error payload is forwarded as-is; transport failures are
    /// wrapped in a minimal envelope since there is no body to forward.
    pub fn to_body(&self) -> Value {
        match self {
            UpstreamError::ErrorPayload { body } => body.clone(),
            other => json!({ "error": other.to_string() }),
        }
    }
}
