//! Error types for the websocket relay.

/// Errors that can occur while relaying websocket traffic.
///
/// A failed upstream connection drops the client connection it was paired
/// with; other clients and their upstream connections are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Could not establish the upstream websocket connection.
    #[error("Failed to connect to upstream websocket at {url}")]
    UpstreamConnect {
        /// The upstream URL
        url: String,
        /// The underlying connection error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl RelayError {
    /// Helper to create an `UpstreamConnect` error from any error type.
    pub fn upstream_connect(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RelayError::UpstreamConnect {
            url: url.into(),
            source: Box::new(source),
        }
    }
}
