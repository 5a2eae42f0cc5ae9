//! Project record and the per-project automation configuration it carries.

use super::{ProjectId, ProjectKey, TrackerDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated absolute http(s) webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebhookUrl(String);

impl WebhookUrl {
    /// Creates a validated webhook URL.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerDomainError::InvalidWebhookUrl`] when the value is
    /// not an absolute `http://` or `https://` URL with a non-empty host.
    pub fn new(value: impl Into<String>) -> Result<Self, TrackerDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        let remainder = normalized
            .strip_prefix("https://")
            .or_else(|| normalized.strip_prefix("http://"));
        let has_host = remainder.is_some_and(|rest| {
            rest.split('/').next().is_some_and(|host| !host.is_empty())
        });

        if !has_host {
            return Err(TrackerDomainError::InvalidWebhookUrl(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the URL as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebhookUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-project automation flags read by the status-transition orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationConfig {
    claude_auto_execute: bool,
    auto_move_to_review: bool,
    slack_webhook_url: Option<WebhookUrl>,
}

impl AutomationConfig {
    /// Creates a configuration with all automation disabled.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            claude_auto_execute: false,
            auto_move_to_review: false,
            slack_webhook_url: None,
        }
    }

    /// Enables automatic execution when an issue enters `IN_PROGRESS`.
    #[must_use]
    pub const fn with_auto_execute(mut self, enabled: bool) -> Self {
        self.claude_auto_execute = enabled;
        self
    }

    /// Enables automatic move to `REVIEW` after a successful execution.
    #[must_use]
    pub const fn with_auto_move_to_review(mut self, enabled: bool) -> Self {
        self.auto_move_to_review = enabled;
        self
    }

    /// Sets the notification webhook endpoint.
    #[must_use]
    pub fn with_webhook(mut self, url: WebhookUrl) -> Self {
        self.slack_webhook_url = Some(url);
        self
    }

    /// Whether an execution should start when an issue enters `IN_PROGRESS`.
    #[must_use]
    pub const fn claude_auto_execute(&self) -> bool {
        self.claude_auto_execute
    }

    /// Whether a successful execution should move the issue to `REVIEW`.
    #[must_use]
    pub const fn auto_move_to_review(&self) -> bool {
        self.auto_move_to_review
    }

    /// Returns the configured webhook endpoint, if any.
    #[must_use]
    pub const fn slack_webhook_url(&self) -> Option<&WebhookUrl> {
        self.slack_webhook_url.as_ref()
    }
}

/// Project record.
///
/// Read-only from the automation layer's perspective; only project
/// management mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    key: ProjectKey,
    name: String,
    automation: AutomationConfig,
    created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerDomainError::EmptyProjectName`] when the name is
    /// empty after trimming.
    pub fn new(
        key: ProjectKey,
        name: impl Into<String>,
        automation: AutomationConfig,
        clock: &impl Clock,
    ) -> Result<Self, TrackerDomainError> {
        let normalized_name = name.into().trim().to_owned();
        if normalized_name.is_empty() {
            return Err(TrackerDomainError::EmptyProjectName);
        }

        Ok(Self {
            id: ProjectId::new(),
            key,
            name: normalized_name,
            automation,
            created_at: clock.utc(),
        })
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project key.
    #[must_use]
    pub const fn key(&self) -> &ProjectKey {
        &self.key
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the automation configuration.
    #[must_use]
    pub const fn automation(&self) -> &AutomationConfig {
        &self.automation
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
