//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all endpoints
//! - Middleware stack (request id, logging, tracing, timeouts)
//! - Health lifecycle and bounded graceful shutdown

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{attestation, health, index, label, not_found};
use crate::state::ServerState;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// Middleware stack, outermost first:
/// 1. Request ID assignment
/// 2. Request logging (sees the id from 1)
/// 3. HTTP tracing spans
/// 4. Request body read timeout
/// 5. Whole-request timeout (a slow archive fetch can hit this)
pub fn build_router(state: Arc<ServerState>) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(health::healthz))
        .route("/attestation", get(attestation::attestation))
        .route("/sampleIdToBarCode", get(label::sample_id_to_barcode))
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.write_timeout(),
        ))
        .layer(RequestBodyTimeoutLayer::new(config.read_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .with_state(state)
}

/// Start the docvault HTTP server
///
/// Initializes logging, builds the shared state around the configured FTP
/// archive, binds the listener and serves until SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    tracing::info!("Server is starting...");

    let addr: SocketAddr = config.socket_addr()?;
    tracing::info!(
        directory = %config.directory.display(),
        archive = ?config.archive,
        "Configuration loaded"
    );
    tracing::info!(
        "Timeouts: read {}s, write {}s, shutdown grace {}s",
        config.read_timeout_secs,
        config.write_timeout_secs,
        config.shutdown_grace_secs
    );

    let state = Arc::new(ServerState::new(config)?);
    let listener = TcpListener::bind(addr).await?;

    serve(listener, state, shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Serve on `listener` until `shutdown` resolves, then drain.
///
/// The health flag is raised just before accepting and dropped the moment
/// `shutdown` fires. In-flight requests then get up to
/// `shutdown_grace_secs` to finish; past that the server task is aborted
/// and an error is returned.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let grace = state.config.shutdown_grace();
    let draining = Arc::new(Notify::new());
    let app = build_router(state.clone());

    let on_shutdown = {
        let state = state.clone();
        let draining = draining.clone();
        async move {
            shutdown.await;
            state.health.mark_unhealthy();
            tracing::info!("Server is shutting down...");
            draining.notify_one();
        }
    };

    let local_addr = listener.local_addr()?;
    state.health.mark_healthy();
    tracing::info!("Server is ready to handle requests at {}", local_addr);

    let mut server = tokio::spawn(
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(on_shutdown)
        .into_future(),
    );

    tokio::select! {
        joined = &mut server => {
            state.health.mark_unhealthy();
            joined??;
            return Ok(());
        }
        () = draining.notified() => {}
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => {
            joined??;
            Ok(())
        }
        Err(_) => {
            server.abort();
            anyhow::bail!(
                "could not gracefully shut down within {}s",
                grace.as_secs()
            )
        }
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
