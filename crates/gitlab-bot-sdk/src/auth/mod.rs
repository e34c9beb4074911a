//! Project access tokens.
//!
//! GitLab project and group access tokens are scoped to a project, so a bot
//! serving several projects may need one token per project. [`CredentialMap`]
//! holds that mapping, with an optional fallback token for deployments that
//! use a single token everywhere.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CredentialError;
use crate::ids::ProjectId;

/// A GitLab personal, project, or group access token.
///
/// The buffer is wiped when the token is dropped and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the raw token for use in the `PRIVATE-TOKEN` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<REDACTED>)")
    }
}

/// One record of the `GITLAB_TOKENS` JSON document.
#[derive(Debug, Deserialize)]
struct TokenEntry {
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

/// Mapping from project to access token.
///
/// # Examples
///
/// ```
/// use gitlab_bot_sdk::auth::{AccessToken, CredentialMap};
/// use gitlab_bot_sdk::ProjectId;
///
/// let credentials = CredentialMap::single(AccessToken::new("glpat-all"));
/// assert!(credentials.token_for(ProjectId::new(42)).is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CredentialMap {
    tokens: HashMap<ProjectId, AccessToken>,
    fallback: Option<AccessToken>,
}

impl CredentialMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one token for every project.
    pub fn single(token: AccessToken) -> Self {
        Self {
            tokens: HashMap::new(),
            fallback: Some(token),
        }
    }

    /// Parse the per-project token list.
    ///
    /// The expected shape is
    /// `[{"project": "46465722", "token": "glpat-..."}, ...]`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] if the document is not valid JSON, is
    /// empty, or an entry lacks a project or token or has a non-numeric
    /// project id.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let entries: Vec<TokenEntry> = serde_json::from_str(json)?;
        if entries.is_empty() {
            return Err(CredentialError::Empty);
        }

        let mut map = Self::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let project = match entry.project {
                Some(p) if !p.trim().is_empty() => p,
                _ => return Err(CredentialError::MissingProject { index }),
            };

            let token = match entry.token {
                Some(t) if !t.is_empty() => t,
                _ => return Err(CredentialError::MissingToken { project }),
            };

            let project_id: ProjectId = project.parse()?;
            map.insert(project_id, AccessToken::new(token));
        }

        Ok(map)
    }

    /// Add or replace the token for a project.
    pub fn insert(&mut self, project_id: ProjectId, token: AccessToken) {
        self.tokens.insert(project_id, token);
    }

    /// Set the token used for projects without a specific entry.
    pub fn with_fallback(mut self, token: AccessToken) -> Self {
        self.fallback = Some(token);
        self
    }

    /// Look up the token for a project, falling back to the shared token.
    pub fn token_for(&self, project_id: ProjectId) -> Option<&AccessToken> {
        self.tokens.get(&project_id).or(self.fallback.as_ref())
    }

    /// Number of project-specific entries.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// `true` when neither project tokens nor a fallback are configured.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.fallback.is_none()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
