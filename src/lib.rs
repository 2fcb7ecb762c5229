//! rpcvalve: a caching reverse proxy for rate-limited JSON-RPC endpoints.
//!
//! The proxy sits between a client and an upstream node, reducing forwarded
//! call volume three ways: idempotent responses are cached with a TTL per
//! method classification, bursts of identical requests are throttled so they
//! land on a single cached result, and upstream failures are retried with
//! exponential backoff before an error reaches the client.
//!
//! For websocket upstreams the proxy instead runs a verbatim bidirectional
//! relay with no caching or retry (see [`relay`]).

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod policy;
pub mod proxy;
pub mod relay;
pub mod server;
pub mod stats;
pub mod upstream;

pub use cache::{CacheKey, MemoryStore, ResponseCache, SqliteStore, TimestampMillis};
pub use config::{ListenMode, ProxyConfig};
pub use dedup::DuplicateDetector;
pub use errors::{CacheError, ConfigError, RelayError, UpstreamError, ValveError};
pub use policy::{MethodClass, MethodPolicy};
pub use proxy::{ProxyResponse, RequestCoordinator, RpcRequest};
pub use stats::{StatsCollector, StatsSnapshot};
pub use upstream::{RetryConfig, UpstreamClient};
