//! Identifier and validated scalar types for the tracker domain.

use super::TrackerDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an issue record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(Uuid);

impl IssueId {
    /// Creates a new random issue identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an issue identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a project record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a new random project identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a project identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short uppercase project key used as the issue code prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(String);

impl ProjectKey {
    const MIN_LEN: usize = 2;
    const MAX_LEN: usize = 10;

    /// Creates a validated project key.
    ///
    /// Keys are trimmed and upper-cased; they must be 2-10 ASCII
    /// alphanumeric characters starting with a letter.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerDomainError::InvalidProjectKey`] when the value does
    /// not meet the format requirements.
    pub fn new(value: impl Into<String>) -> Result<Self, TrackerDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_uppercase();
        let starts_with_letter = normalized
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_alphabetic());
        let is_valid = normalized.len() >= Self::MIN_LEN
            && normalized.len() <= Self::MAX_LEN
            && starts_with_letter
            && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());

        if !is_valid {
            return Err(TrackerDomainError::InvalidProjectKey(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-readable issue code in `KEY-NNN` format, e.g. `BUG-001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueCode(String);

impl IssueCode {
    /// Builds the code for the `sequence`-th issue of a project.
    ///
    /// Sequence numbers are zero-padded to three digits; larger values keep
    /// their natural width.
    #[must_use]
    pub fn from_sequence(key: &ProjectKey, sequence: u64) -> Self {
        Self(format!("{key}-{sequence:03}"))
    }

    /// Creates a validated issue code from a raw string.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerDomainError::InvalidIssueCode`] when the value is not
    /// a valid project key, a dash, and a numeric suffix.
    pub fn new(value: impl Into<String>) -> Result<Self, TrackerDomainError> {
        let raw = value.into();
        let normalized = raw.trim().to_ascii_uppercase();
        let Some((key_part, number_part)) = normalized.rsplit_once('-') else {
            return Err(TrackerDomainError::InvalidIssueCode(raw));
        };
        let key_is_valid = ProjectKey::new(key_part).is_ok();
        let number_is_valid =
            !number_part.is_empty() && number_part.chars().all(|ch| ch.is_ascii_digit());

        if !key_is_valid || !number_is_valid {
            return Err(TrackerDomainError::InvalidIssueCode(raw));
        }

        Ok(Self(normalized))
    }

    /// Returns the code as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
