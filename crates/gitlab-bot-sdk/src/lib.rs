//! # GitLab Bot SDK
//!
//! Software Development Kit for GitLab bot integration: project-scoped access
//! tokens, a REST v4 API client, and the identifier types shared with the
//! pipeline bridge.
//!
//! This SDK provides:
//! - Per-project access tokens with a single-token convenience mode
//! - API client with request timeouts and typed error classification
//! - Branch, merge request, discussion, and pipeline operations
//!
//! # Examples
//!
//! ## Building a client for one project
//!
//! ```rust,no_run
//! use gitlab_bot_sdk::auth::{AccessToken, CredentialMap};
//! use gitlab_bot_sdk::client::{ClientConfig, GitLabClient};
//! use gitlab_bot_sdk::ProjectId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = CredentialMap::single(AccessToken::new("glpat-example"));
//! let client = GitLabClient::new(ClientConfig::default(), credentials)?;
//!
//! let project = client.for_project(ProjectId::new(44723537))?;
//! let user = project.current_user().await?;
//! println!("Authenticated as {}", user.username);
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading per-project tokens
//!
//! ```rust
//! use gitlab_bot_sdk::auth::CredentialMap;
//! use gitlab_bot_sdk::ProjectId;
//!
//! let json = r#"[{"project": "46465722", "token": "glpat-121211"}]"#;
//! let credentials = CredentialMap::from_json(json).unwrap();
//!
//! assert!(credentials.token_for(ProjectId::new(46465722)).is_some());
//! assert!(credentials.token_for(ProjectId::new(1)).is_none());
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod ids;

pub use auth::{AccessToken, CredentialMap};
pub use error::{ApiError, CredentialError};
pub use ids::{MergeRequestId, MergeRequestIid, ProjectId, UserId};
