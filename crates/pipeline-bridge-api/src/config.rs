//! Configuration types for the HTTP service

use gitlab_bot_sdk::auth::{AccessToken, CredentialMap};
use gitlab_bot_sdk::client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::errors::ConfigError;

/// Environment variable naming an extra YAML configuration file.
pub const CONFIG_FILE_ENV: &str = "BRIDGE_CONFIG_FILE";

/// Prefix for structured environment overrides, e.g. `BRIDGE__SERVER__PORT`.
pub const ENV_PREFIX: &str = "BRIDGE";

/// Legacy variable holding the webhook shared secret.
pub const LEGACY_SECRET_TOKEN_ENV: &str = "SECRET_TOKEN";

/// Legacy variable holding the per-project token list as JSON.
pub const LEGACY_GITLAB_TOKENS_ENV: &str = "GITLAB_TOKENS";

/// Legacy variable holding a single token used for every project.
pub const LEGACY_GITLAB_TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub webhook: WebhookConfig,

    /// GitLab API access
    pub gitlab: GitLabConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from files and the process environment.
    ///
    /// Sources, later ones overriding earlier ones:
    ///  1. `/etc/pipeline-bridge/service.yaml`
    ///  2. `config/service.yaml`
    ///  3. the file named by `BRIDGE_CONFIG_FILE` (must exist when set)
    ///  4. `BRIDGE__`-prefixed variables, `__` separating nested keys
    ///  5. the legacy `SECRET_TOKEN`, `GITLAB_TOKENS` and `GITLAB_TOKEN`
    ///
    /// The result is not validated; call [`ServiceConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(
                config::File::with_name("/etc/pipeline-bridge/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            )
            .add_source(
                config::File::with_name("config/service")
                    .required(false)
                    .format(config::FileFormat::Yaml),
            );

        if let Some(explicit_path) = non_empty_env(CONFIG_FILE_ENV) {
            info!(path = %explicit_path, "Loading configuration from explicit path");
            builder = builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("webhook.secret_token", non_empty_env(LEGACY_SECRET_TOKEN_ENV))?
            .set_override_option("gitlab.tokens", non_empty_env(LEGACY_GITLAB_TOKENS_ENV))?
            .set_override_option("gitlab.token", non_empty_env(LEGACY_GITLAB_TOKEN_ENV))?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Invalid` for a zero port, a zero GitLab timeout or an
    ///   endpoint path that does not start with `/`
    /// - `ConfigError::Missing` when no GitLab access token is configured
    /// - `ConfigError::Credentials` when the token list cannot be parsed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        if !self.webhook.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.endpoint_path '{}' must start with '/'",
                    self.webhook.endpoint_path
                ),
            });
        }

        if self.gitlab.timeout_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "gitlab.timeout_seconds must be non-zero".to_string(),
            });
        }

        self.gitlab.credentials()?;
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Webhook endpoint configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Shared secret expected in `X-Gitlab-Token`; absent or empty disables
    /// the check
    pub secret_token: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhook".to_string(),
            secret_token: None,
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("endpoint_path", &self.endpoint_path)
            .field("secret_token", &self.secret_token.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// GitLab API configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    /// REST API base URL
    pub api_url: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent override
    pub user_agent: Option<String>,

    /// Access token used for every project without a specific entry
    pub token: Option<String>,

    /// Per-project tokens as JSON: `[{"project": "<id>", "token": "<token>"}]`
    pub tokens: Option<String>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            api_url: "https://gitlab.com/api/v4".to_string(),
            timeout_seconds: 30,
            user_agent: None,
            token: None,
            tokens: None,
        }
    }
}

impl fmt::Debug for GitLabConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitLabConfig")
            .field("api_url", &self.api_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .field("token", &self.token.as_ref().map(|_| "<REDACTED>"))
            .field("tokens", &self.tokens.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl GitLabConfig {
    /// Build the credential map from `tokens` and `token`.
    ///
    /// Project-specific tokens win; `token` becomes the fallback for every
    /// other project.
    pub fn credentials(&self) -> Result<CredentialMap, ConfigError> {
        let tokens = self.tokens.as_deref().filter(|t| !t.trim().is_empty());
        let token = self.token.as_deref().filter(|t| !t.is_empty());

        let mut credentials = match tokens {
            Some(json) => CredentialMap::from_json(json)?,
            None => CredentialMap::new(),
        };
        if let Some(token) = token {
            credentials = credentials.with_fallback(AccessToken::new(token));
        }

        if credentials.is_empty() {
            return Err(ConfigError::Missing {
                key: "gitlab.token or gitlab.tokens".to_string(),
            });
        }
        Ok(credentials)
    }

    /// Settings for the GitLab REST client.
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::default()
            .with_api_url(self.api_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_seconds));

        match &self.user_agent {
            Some(agent) if !agent.is_empty() => config.with_user_agent(agent.clone()),
            _ => config,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
