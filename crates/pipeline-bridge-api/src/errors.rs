//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gitlab_bot_sdk::CredentialError;
use pipeline_bridge_core::BridgeError;
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// GitLab only distinguishes success from failure, so every processing
/// failure is answered with `500 Internal Server Error` and the error text as
/// a plain-text body. GitLab shows that text in the webhook's recent
/// deliveries view.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Authentication, classification, or GitLab call failure.
    #[error(transparent)]
    Processing(#[from] BridgeError),
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        match &self {
            Self::Processing(e) if e.is_transient() => {
                error!(error = %e, transient = true, "Webhook processing failed");
            }
            Self::Processing(e) => {
                warn!(error = %e, transient = false, "Webhook processing failed");
            }
        }

        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {0}")]
    Loading(#[from] config::ConfigError),

    #[error("Invalid GitLab access tokens: {0}")]
    Credentials(#[from] CredentialError),
}
