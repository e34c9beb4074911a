//! # Pipeline Bridge Service
//!
//! Binary entry point for the GitLab pipeline bridge.
//!
//! This executable:
//! - Loads configuration from files and the environment
//! - Initializes logging
//! - Builds the GitLab client and the webhook bridge
//! - Starts the HTTP server from pipeline-bridge-api
//!
//! Exit codes: 1 bind failure, 2 server failure, 3 configuration error.

use gitlab_bot_sdk::client::GitLabClient;
use pipeline_bridge_api::{start_server, LoggingConfig, ServiceConfig, ServiceError};
use pipeline_bridge_core::gateway::GitLabGatewayProvider;
use pipeline_bridge_core::WebhookBridge;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CONFIG_EXIT_CODE: i32 = 3;

#[tokio::main]
async fn main() {
    // Configuration decides the log format, so it is loaded before logging
    // exists. Failures are reported once a default subscriber is in place.
    let service_config = match ServiceConfig::load() {
        Ok(config) => {
            init_logging(&config.logging);
            config
        }
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!(error = %e, "Failed to load configuration; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    info!("Starting pipeline bridge service");

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(CONFIG_EXIT_CODE);
    }

    let credentials = match service_config.gitlab.credentials() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!(error = %e, "Failed to read GitLab access tokens; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };
    info!(
        project_tokens = credentials.len(),
        api_url = %service_config.gitlab.api_url,
        "Loaded GitLab credentials"
    );

    let client = match GitLabClient::new(service_config.gitlab.client_config(), credentials) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to build GitLab client; aborting");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    let bridge = WebhookBridge::new(
        service_config.webhook.secret_token.clone(),
        Arc::new(GitLabGatewayProvider::new(client)),
    );
    if !bridge.requires_token() {
        warn!("No webhook secret configured; X-Gitlab-Token will not be checked");
    }

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhook.endpoint_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, Arc::new(bridge)).await {
        error!(error = %e, "HTTP server stopped with an error");

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => CONFIG_EXIT_CODE,
        };

        std::process::exit(exit_code);
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &logging.level;
        format!(
            "pipeline_bridge_service={level},pipeline_bridge_api={level},pipeline_bridge_core={level},gitlab_bot_sdk={level},tower_http=debug"
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json_format {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
