//! Error types for GitLab Bot SDK operations.
//!
//! This module defines the error types used throughout the SDK, with
//! classification of transient failures for callers that want to decide on
//! their own retry policy. The SDK itself never retries.

use thiserror::Error;

/// Errors during GitLab API operations.
///
/// These errors represent failures when communicating with the GitLab API,
/// including HTTP errors, timeouts, and parsing failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP error response from GitLab API.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Request to GitLab API timed out.
    #[error("Request timeout")]
    Timeout,

    /// The request was invalid (client error).
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// The access token was rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The access token lacks the scope required for the operation.
    #[error("Authorization failed")]
    AuthorizationFailed,

    /// The requested resource was not found.
    #[error("Resource not found")]
    NotFound,

    /// Client construction or binding failed.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Failed to parse JSON response from GitLab API.
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (network, TLS, etc.).
    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}

impl ApiError {
    /// Check if this error represents a transient condition that may succeed if retried.
    ///
    /// Transient conditions include:
    /// - Server errors (5xx)
    /// - Rate limiting (429)
    /// - Request timeouts
    /// - Network/transport errors
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout => true,
            Self::InvalidRequest { .. } => false,
            Self::AuthenticationFailed => false,
            Self::AuthorizationFailed => false,
            Self::NotFound => false,
            Self::Configuration { .. } => false,
            Self::JsonError(_) => false,
            Self::HttpClientError(e) => !e.is_decode() && !e.is_builder(),
        }
    }

    /// Map a non-success HTTP status and body to the matching variant.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            400 | 422 => Self::InvalidRequest { message: body },
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 => Self::NotFound,
            _ => Self::HttpError {
                status,
                message: body,
            },
        }
    }

    /// Convert a transport error, folding timeouts into [`ApiError::Timeout`].
    pub(crate) fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::HttpClientError(error)
        }
    }
}

/// Errors while loading project access tokens.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The token document is not valid JSON of the expected shape.
    #[error("Token list is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// An entry has no `project` value.
    #[error("Project id has not been set for token entry {index}")]
    MissingProject { index: usize },

    /// An entry has no `token` value.
    #[error("Access token has not been set for project {project}")]
    MissingToken { project: String },

    /// An entry's `project` is not a numeric GitLab project id.
    #[error("Failed to parse project id '{value}'")]
    InvalidProjectId { value: String },

    /// No tokens were supplied at all.
    #[error("No GitLab access tokens configured")]
    Empty,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
