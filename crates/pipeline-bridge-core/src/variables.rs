//! Variables injected into triggered pipelines.

use gitlab_bot_sdk::client::PipelineVariableInput;

use crate::policy::TriggerDecision;

pub const MERGE_REQUEST_EVENT_NAME: &str = "MERGE_REQUEST_EVENT_NAME";
pub const IS_MERGEABLE: &str = "IS_MERGEABLE";
pub const CI_MERGE_REQUEST_IID: &str = "CI_MERGE_REQUEST_IID";
pub const DIGGER_COMMAND: &str = "DIGGER_COMMAND";
pub const DISCUSSION_ID: &str = "DISCUSSION_ID";

/// Ordered set of pipeline variables with unique keys.
///
/// # Examples
///
/// ```
/// use pipeline_bridge_core::PipelineVariableSet;
///
/// let mut variables = PipelineVariableSet::new();
/// variables.insert("IS_MERGEABLE", "false");
/// variables.insert("IS_MERGEABLE", "true");
///
/// assert_eq!(variables.len(), 1);
/// assert_eq!(variables.get("IS_MERGEABLE"), Some("true"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineVariableSet {
    entries: Vec<(String, String)>,
}

impl PipelineVariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the variables for a decision.
    ///
    /// Keys always appear in the same order. A key is left out when its
    /// source value is absent, empty, or zero.
    pub fn from_decision(decision: &TriggerDecision) -> Self {
        let mut variables = Self::new();

        if !decision.canonical_event_name.is_empty() {
            variables.insert(MERGE_REQUEST_EVENT_NAME, &decision.canonical_event_name);
        }

        if let Some(is_mergeable) = decision.is_mergeable {
            variables.insert(IS_MERGEABLE, is_mergeable.to_string());
        }

        if decision.merge_request_iid.as_u64() != 0 {
            variables.insert(CI_MERGE_REQUEST_IID, decision.merge_request_iid.to_string());
        }

        if let Some(command) = decision.command.as_deref().filter(|c| !c.is_empty()) {
            variables.insert(DIGGER_COMMAND, command);
        }

        if let Some(discussion_id) = decision.discussion_id.as_deref().filter(|d| !d.is_empty()) {
            variables.insert(DISCUSSION_ID, discussion_id);
        }

        variables
    }

    /// Set a variable, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Convert to the `env_var` entries of a pipeline creation request.
    pub fn to_inputs(&self) -> Vec<PipelineVariableInput> {
        self.iter()
            .map(|(key, value)| PipelineVariableInput::env_var(key, value))
            .collect()
    }
}

#[cfg(test)]
#[path = "variables_tests.rs"]
mod tests;
