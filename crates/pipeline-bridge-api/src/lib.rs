//! # Pipeline Bridge HTTP Service
//!
//! HTTP server that receives GitLab webhooks and hands them to the
//! [`WebhookBridge`].
//!
//! This service provides:
//! - The GitLab webhook endpoint (`POST /webhook` by default)
//! - A health check endpoint (`GET /health`)

pub mod config;
pub mod errors;

pub use config::{GitLabConfig, LoggingConfig, ServerConfig, ServiceConfig, WebhookConfig};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use pipeline_bridge_core::{BridgeOutcome, WebhookBridge, WebhookRequest};
use serde::{Deserialize, Serialize};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: ServiceConfig,

    /// Webhook bridge that classifies deliveries and triggers pipelines
    pub bridge: Arc<WebhookBridge>,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServiceConfig, bridge: Arc<WebhookBridge>) -> Self {
        Self { config, bridge }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Router and server
// ============================================================================

/// Create the HTTP router
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .route(&state.config.webhook.endpoint_path, post(handle_webhook))
        .route("/health", get(handle_health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(max_body_size)),
        )
        .with_state(state)
}

/// Start the HTTP server and run until SIGINT or SIGTERM.
///
/// In-flight requests get `server.shutdown_timeout_seconds` to finish after
/// the signal; anything still running after that is dropped.
pub async fn start_server(
    config: ServiceConfig,
    bridge: Arc<WebhookBridge>,
) -> Result<(), ServiceError> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);

    let app = create_router(AppState::new(config, bridge));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServiceError::BindFailed {
            address: address.clone(),
            message: e.to_string(),
        })?;

    info!(address = %address, "Starting HTTP server");

    let signalled = Arc::new(Notify::new());
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(signalled.clone()))
        .into_future();

    let drain_deadline = async {
        signalled.notified().await;
        tokio::time::sleep(shutdown_timeout).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| ServiceError::ServerFailed {
                message: e.to_string(),
            })?;
        }
        _ = drain_deadline => {
            warn!(
                timeout_seconds = shutdown_timeout.as_secs(),
                "Graceful shutdown timed out; dropping in-flight requests"
            );
        }
    }

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM and record the signal in `signalled`.
///
/// A signal handler that cannot be installed is logged and never fires.
async fn shutdown_signal(signalled: Arc<Notify>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }

    signalled.notify_one();
}

// ============================================================================
// Handlers
// ============================================================================

/// Handle GitLab webhook deliveries
///
/// Header names are lower-cased before they reach the bridge. Any outcome
/// that is not an error, including suppressed and unsupported events, is
/// answered with an empty `200 OK`.
#[instrument(skip(state, headers, body), fields(body_size = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookHandlerError> {
    let header_pairs = headers.iter().map(|(name, value)| {
        (
            name.as_str().to_lowercase(),
            value.to_str().unwrap_or("").to_string(),
        )
    });
    let request = WebhookRequest::new(header_pairs, body);

    match state.bridge.process(&request).await? {
        BridgeOutcome::PipelineCreated {
            project_id,
            branch,
            pipeline_id,
        } => {
            info!(project_id = %project_id, branch = %branch, pipeline_id, "Pipeline triggered");
        }
        BridgeOutcome::Suppressed { reason } => {
            info!(reason = %reason, "Webhook accepted without triggering a pipeline");
        }
        BridgeOutcome::Ignored { event_type } => {
            info!(event_type = %event_type, "Webhook accepted and ignored");
        }
    }

    Ok(StatusCode::OK)
}

/// Liveness check
pub async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
