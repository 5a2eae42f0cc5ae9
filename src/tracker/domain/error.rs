//! Error types for tracker domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or mutating tracker domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerDomainError {
    /// The project key does not follow the 2-10 character alphanumeric
    /// format.
    #[error("invalid project key '{0}', expected 2-10 alphanumeric characters")]
    InvalidProjectKey(String),

    /// The issue code does not follow `KEY-NNN` format.
    #[error("invalid issue code '{0}', expected KEY-NNN")]
    InvalidIssueCode(String),

    /// The issue title is empty after trimming.
    #[error("issue title must not be empty")]
    EmptyIssueTitle,

    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// The webhook URL is not an absolute http(s) URL.
    #[error("invalid webhook url '{0}', expected http:// or https://")]
    InvalidWebhookUrl(String),

    /// The label is empty after trimming.
    #[error("label must not be empty")]
    EmptyLabel,
}

/// Error returned while parsing issue statuses from storage or transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown issue status: {0}")]
pub struct ParseIssueStatusError(pub String);

/// Error returned while parsing issue types from storage or transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown issue type: {0}")]
pub struct ParseIssueTypeError(pub String);

/// Error returned while parsing issue priorities from storage or transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown issue priority: {0}")]
pub struct ParseIssuePriorityError(pub String);
