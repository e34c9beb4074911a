//! Raw webhook request as received from GitLab.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;

/// Header carrying the shared secret configured on the GitLab webhook.
pub const GITLAB_TOKEN_HEADER: &str = "x-gitlab-token";

/// Header naming the webhook event type, e.g. `Merge Request Hook`.
pub const GITLAB_EVENT_HEADER: &str = "x-gitlab-event";

/// Transport-independent webhook request.
///
/// Header names are lower-cased on construction so lookups are
/// case-insensitive.
///
/// # Examples
///
/// ```
/// use pipeline_bridge_core::webhook::WebhookRequest;
///
/// let request = WebhookRequest::new(
///     [("X-Gitlab-Event", "Note Hook")],
///     r#"{"object_kind":"note"}"#,
/// );
/// assert_eq!(request.event_type(), Some("Note Hook"));
/// assert_eq!(request.header("X-GITLAB-EVENT"), Some("Note Hook"));
/// ```
#[derive(Clone)]
pub struct WebhookRequest {
    headers: HashMap<String, String>,
    body: Bytes,
}

impl WebhookRequest {
    /// Create a request from header pairs and a body.
    pub fn new<I, K, V>(headers: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();

        Self {
            headers,
            body: body.into(),
        }
    }

    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Value of `X-Gitlab-Event`, if sent.
    pub fn event_type(&self) -> Option<&str> {
        self.header(GITLAB_EVENT_HEADER)
    }

    /// Value of `X-Gitlab-Token`, if sent.
    pub fn token(&self) -> Option<&str> {
        self.header(GITLAB_TOKEN_HEADER)
    }

    /// Raw request body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

// The shared secret must never reach the logs.
impl fmt::Debug for WebhookRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: HashMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name == GITLAB_TOKEN_HEADER {
                    (name.as_str(), "<REDACTED>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("WebhookRequest")
            .field("headers", &headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
