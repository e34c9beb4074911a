// User operations for GitLab API

use serde::{Deserialize, Serialize};

use crate::client::{parse_response, ProjectClient};
use crate::error::ApiError;
use crate::ids::UserId;

/// A GitLab user account, as returned by `GET /user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,

    /// Login name
    pub username: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Account state (`active`, `blocked`, ...)
    #[serde(default)]
    pub state: Option<String>,

    /// Whether the account is a bot (project and group access tokens are)
    #[serde(default)]
    pub bot: bool,
}

impl ProjectClient {
    /// Get the user that owns the client's access token.
    ///
    /// For project access tokens this is the project's bot user.
    pub async fn current_user(&self) -> Result<User, ApiError> {
        let response = self.get("/user").await?;
        parse_response(response).await
    }
}
