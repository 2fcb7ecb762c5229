//! Process bootstrap: env loading, backing selection, mode dispatch.

use dotenvy::dotenv;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::cache::{MemoryStore, ResponseCache, SqliteStore};
use crate::config::{ListenMode, ProxyConfig};
use crate::errors::ValveError;
use crate::policy::MethodPolicy;
use crate::proxy::RequestCoordinator;
use crate::stats::StatsSnapshot;
use crate::upstream::UpstreamClient;
use crate::{relay, server};

/// Bound on the shutdown-path entry-count query.
const SHUTDOWN_SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(1);

/// Main entry point for the application.
pub async fn run() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = ProxyConfig::from_env()?;
    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;

    match config.mode {
        ListenMode::Http => run_http(listener, config).await,
        ListenMode::Websocket => run_relay(listener, config).await,
    }
}

async fn run_http(listener: TcpListener, config: ProxyConfig) -> anyhow::Result<()> {
    let cache = build_cache(&config).await?;
    let upstream = UpstreamClient::new(config.rpc.clone());
    let policy = MethodPolicy::new(config.cache_max_age);
    let coordinator = Arc::new(RequestCoordinator::new(cache, upstream, policy));

    info!(
        address = ?listener.local_addr()?,
        upstream = %config.rpc,
        backend = coordinator.cache_name(),
        volatile_ttl_secs = config.cache_max_age.as_secs(),
        "starting HTTP proxy"
    );

    let snapshot = serve_with_shutdown(listener, coordinator, shutdown_signal()).await?;
    info!(%snapshot, "final stats");

    Ok(())
}

/// Selects the cache backing once at startup, never branched on per-call.
async fn build_cache(config: &ProxyConfig) -> Result<Arc<dyn ResponseCache>, ValveError> {
    Ok(match &config.cache_db {
        Some(path) => Arc::new(SqliteStore::connect(path).await?),
        None => Arc::new(MemoryStore::new()),
    })
}

/// Serves the HTTP surface until `shutdown` resolves, then snapshots.
///
/// The serve future is dropped the moment the signal arrives: in-flight
/// requests, including any that are mid-retry in a backoff sleep, are
/// abandoned rather than drained, so the final stats dump and the process
/// exit are never held up by a slow upstream.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    coordinator: Arc<RequestCoordinator>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<StatsSnapshot> {
    let serve = axum::serve(listener, server::router(Arc::clone(&coordinator))).into_future();
    tokio::select! {
        result = serve => result?,
        () = shutdown => info!("abandoning in-flight requests"),
    }
    Ok(coordinator.shutdown_snapshot(SHUTDOWN_SNAPSHOT_TIMEOUT).await)
}

async fn run_relay(listener: TcpListener, config: ProxyConfig) -> anyhow::Result<()> {
    info!(
        address = ?listener.local_addr()?,
        upstream = %config.rpc,
        "starting websocket relay"
    );

    let serve = axum::serve(listener, relay::router(config.rpc)).into_future();
    tokio::select! {
        result = serve => result?,
        () = shutdown_signal() => info!("dropping relay connections"),
    }

    Ok(())
}

/// Resolves on SIGINT (ctrl-c) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
