//! Telemetry Gateway API Server
//!
//! This crate provides the HTTP server that accepts structured logs and
//! metric submissions from client services and exposes the aggregated
//! metrics for pull-scraping.
//!
//! # Architecture
//!
//! The API server is built on Axum and Tokio, providing:
//! - Log ingestion endpoints (single entry and batch) backed by the
//!   normalizer, router and sink from [`shared::logs`]
//! - A metric submission endpoint backed by [`shared::registry::Registry`]
//! - A `/metrics` endpoint in the text exposition format
//! - Request accounting middleware with a per-request deadline
//!
//! # Example
//!
//! ```no_run
//! use api::{init_logging, run_server_with_config, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let _guard = init_logging(&config.logging)?;
//!     run_server_with_config(config).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod logging;
mod metrics;
mod middleware;
mod routes;
mod state;

pub use config::{Config, LogFormat, LoggingConfig};
pub use error::ApiError;
pub use logging::init as init_logging;
pub use state::AppState;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use shared::logs::ChannelSink;
use shared::registry::Registry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Request body limit used when none is configured.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Runs the gateway with the provided configuration.
///
/// Builds the registry and log sink, serves until SIGINT or SIGTERM, then
/// waits for the sink to drain before returning.
///
/// # Errors
///
/// Returns an error if:
/// - The configured address or histogram buckets are invalid
/// - The log directory for ingested entries cannot be created
/// - The server fails to bind to the configured address
/// - A fatal error occurs during operation
pub async fn run_server_with_config(config: Config) -> Result<()> {
    let addr = config.socket_addr()?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        request_timeout_secs = config.request_timeout.as_secs(),
        sink_capacity = config.sink_capacity,
        env_file = ?config.env_file,
        "Telemetry gateway starting"
    );

    let registry = Arc::new(
        Registry::with_default_buckets(&config.histogram_buckets)
            .context("invalid histogram buckets")?,
    );
    // Dropped after the drain below so the last ingested lines are flushed.
    let (ingested, _ingested_guard) = logging::ingested_writer(&config.logging)?;
    let (sink, drain) = ChannelSink::spawn(config.sink_capacity, ingested);
    let state = AppState::new(registry, Arc::new(sink), config.request_timeout)
        .context("failed to declare gateway metrics")?;

    let app = create_router(state, config.max_body_bytes);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router, and with it the last sink handle, is gone once serve returns.
    drain.await.context("log sink task failed")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Creates the main application router with all routes and middleware.
///
/// This function is public to allow testing the router without starting a full server.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::logs_routes())
        .merge(routes::metrics_routes())
        .merge(routes::exposition_routes())
        .fallback(routes::not_found)
        .method_not_allowed_fallback(routes::method_not_allowed)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_requests,
        ))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
