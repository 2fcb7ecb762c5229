//! Error types for cache backends.

/// Errors that can occur in a response cache backend.
///
/// Cache failures never fail the client-facing request: reads are recovered
/// internally as a miss, and writes are fire-and-forget relative to the
/// response path, so callers log these and move on.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to open or migrate the durable cache database.
    ///
    /// This is the one fatal cache error: it occurs at startup, before any
    /// requests are served.
    #[error("Failed to open cache database at {path}")]
    ConnectFailed {
        /// Path to the database file
        path: String,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write an entry.
    ///
    /// The write is lost; the entry keeps its previous value, if any.
    #[error("Failed to write cache entry for {key}")]
    WriteFailed {
        /// The cache key being written
        key: String,
        /// The underlying error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CacheError {
    /// Helper to create a `ConnectFailed` error from any error type.
    pub fn connect(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CacheError::ConnectFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `WriteFailed` error from any error type.
    pub fn write_failed(
        key: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        CacheError::WriteFailed {
            key: key.into(),
            source: Box::new(source),
        }
    }
}
