//! Error types for environment configuration.

/// Errors that can occur when loading configuration from the environment.
///
/// All of these are startup errors: the process refuses to run with a
/// missing or unusable configuration rather than guessing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The required `RPC` environment variable is not set.
    #[error("RPC environment variable is required")]
    MissingRpc,

    /// The `RPC` value is not a valid URL.
    #[error("Invalid RPC url '{value}'")]
    InvalidRpc {
        /// The raw value that failed to parse
        value: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// The `RPC` URL uses a scheme the proxy cannot serve.
    #[error("Unsupported RPC scheme '{scheme}' (expected http, https, ws or wss)")]
    UnsupportedScheme {
        /// The offending scheme
        scheme: String,
    },

    /// A numeric environment variable failed to parse.
    #[error("Invalid {name} value '{value}'")]
    InvalidNumber {
        /// The environment variable name
        name: &'static str,
        /// The raw value that failed to parse
        value: String,
        /// The underlying parse error
        #[source]
        source: std::num::ParseIntError,
    },
}

impl ConfigError {
    /// Helper to create an `InvalidRpc` error.
    pub fn invalid_rpc(value: impl Into<String>, source: url::ParseError) -> Self {
        ConfigError::InvalidRpc {
            value: value.into(),
            source,
        }
    }

    /// Helper to create an `UnsupportedScheme` error.
    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        ConfigError::UnsupportedScheme {
            scheme: scheme.into(),
        }
    }

    /// Helper to create an `InvalidNumber` error.
    pub fn invalid_number(
        name: &'static str,
        value: impl Into<String>,
        source: std::num::ParseIntError,
    ) -> Self {
        ConfigError::InvalidNumber {
            name,
            value: value.into(),
            source,
        }
    }
}
