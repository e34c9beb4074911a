//! # Pipeline Bridge Core
//!
//! Decision logic for the GitLab pipeline bridge: authenticating webhook
//! deliveries, classifying merge request and comment events, deciding whether
//! a CI pipeline should run, and running it with a normalised set of
//! variables.
//!
//! ## Architecture
//!
//! - [`classifier`] turns a raw [`webhook::WebhookRequest`] into a
//!   [`ClassifiedEvent`].
//! - [`policy`] applies the trigger rules and produces a [`TriggerDecision`].
//! - [`trigger`] executes the decision through a [`GitLabGateway`].
//! - [`bridge`] chains the three for one delivery.
//!
//! GitLab is only reached through the [`GitLabGateway`] trait, so the rules
//! can be tested without a network.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gitlab_bot_sdk::auth::{AccessToken, CredentialMap};
//! use gitlab_bot_sdk::client::{ClientConfig, GitLabClient};
//! use pipeline_bridge_core::gateway::GitLabGatewayProvider;
//! use pipeline_bridge_core::webhook::WebhookRequest;
//! use pipeline_bridge_core::WebhookBridge;
//! use std::sync::Arc;
//!
//! # async fn example(body: String) -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = CredentialMap::single(AccessToken::new("glpat-example"));
//! let client = GitLabClient::new(ClientConfig::default(), credentials)?;
//! let bridge = WebhookBridge::new(
//!     Some("webhook-secret".to_string()),
//!     Arc::new(GitLabGatewayProvider::new(client)),
//! );
//!
//! let request = WebhookRequest::new(
//!     [("X-Gitlab-Event", "Merge Request Hook"), ("X-Gitlab-Token", "webhook-secret")],
//!     body,
//! );
//! let outcome = bridge.process(&request).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod classifier;
pub mod events;
pub mod gateway;
pub mod policy;
pub mod trigger;
pub mod variables;
pub mod webhook;

pub use bridge::{BridgeError, BridgeOutcome, WebhookBridge};
pub use classifier::{classify, ClassificationError};
pub use events::{ClassifiedEvent, CommentEvent, MergeRequestAction, MergeRequestEvent};
pub use gateway::{GatewayError, GatewayProvider, GitLabGateway};
pub use policy::{decide, PolicyError, SuppressReason, TriggerDecision};
pub use trigger::{execute, TriggerError, TriggerOutcome};
pub use variables::PipelineVariableSet;
pub use webhook::WebhookRequest;
