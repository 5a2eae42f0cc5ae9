//! Issue aggregate root and its classification enums.

use super::{
    IssueCode, IssueId, ParseIssuePriorityError, ParseIssueStatusError, ParseIssueTypeError,
    ProjectId, TrackerDomainError,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueType {
    /// General unit of work.
    #[serde(rename = "TASK")]
    Task,
    /// Defect report.
    #[serde(rename = "BUG")]
    Bug,
    /// New functionality.
    #[serde(rename = "FEATURE")]
    Feature,
    /// Urgent production fix.
    #[serde(rename = "HOTFIX")]
    Hotfix,
    /// Incremental enhancement to existing behaviour.
    #[serde(rename = "IMPROVEMENT")]
    Improvement,
    /// Large body of work grouping other issues.
    #[serde(rename = "EPIC")]
    Epic,
    /// User-facing requirement.
    #[serde(rename = "STORY")]
    Story,
    /// Child of another issue.
    #[serde(rename = "SUB-TASK")]
    SubTask,
}

impl IssueType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "TASK",
            Self::Bug => "BUG",
            Self::Feature => "FEATURE",
            Self::Hotfix => "HOTFIX",
            Self::Improvement => "IMPROVEMENT",
            Self::Epic => "EPIC",
            Self::Story => "STORY",
            Self::SubTask => "SUB-TASK",
        }
    }
}

impl TryFrom<&str> for IssueType {
    type Error = ParseIssueTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "TASK" => Ok(Self::Task),
            "BUG" => Ok(Self::Bug),
            "FEATURE" => Ok(Self::Feature),
            "HOTFIX" => Ok(Self::Hotfix),
            "IMPROVEMENT" => Ok(Self::Improvement),
            "EPIC" => Ok(Self::Epic),
            "STORY" => Ok(Self::Story),
            "SUB-TASK" | "SUBTASK" => Ok(Self::SubTask),
            _ => Err(ParseIssueTypeError(value.to_owned())),
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue priority.
///
/// Variants are declared lowest first so the derived [`Ord`] ranks
/// `Critical` above `High` above `Medium` above `Low` above `Trivial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssuePriority {
    /// Cosmetic or negligible impact.
    #[serde(rename = "TRIVIAL")]
    Trivial,
    /// Low urgency.
    #[serde(rename = "LOW")]
    Low,
    /// Default urgency.
    #[serde(rename = "MEDIUM")]
    Medium,
    /// High urgency.
    #[serde(rename = "HIGH")]
    High,
    /// Highest urgency.
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl IssuePriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trivial => "TRIVIAL",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl TryFrom<&str> for IssuePriority {
    type Error = ParseIssuePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "TRIVIAL" => Ok(Self::Trivial),
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(ParseIssuePriorityError(value.to_owned())),
        }
    }
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue board column.
///
/// Transitions between statuses are unrestricted; automation reacts only to
/// entry into [`IssueStatus::InProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueStatus {
    /// Not yet started.
    #[serde(rename = "TODO")]
    Todo,
    /// Being worked on.
    #[serde(rename = "IN_PROGRESS")]
    InProgress,
    /// Awaiting review.
    #[serde(rename = "REVIEW")]
    Review,
    /// Under verification.
    #[serde(rename = "TESTING")]
    Testing,
    /// Finished.
    #[serde(rename = "DONE")]
    Done,
    /// Blocked on an external dependency.
    #[serde(rename = "BLOCKED")]
    Blocked,
}

impl IssueStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Review => "REVIEW",
            Self::Testing => "TESTING",
            Self::Done => "DONE",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl TryFrom<&str> for IssueStatus {
    type Error = ParseIssueStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "REVIEW" => Ok(Self::Review),
            "TESTING" => Ok(Self::Testing),
            "DONE" => Ok(Self::Done),
            "BLOCKED" => Ok(Self::Blocked),
            _ => Err(ParseIssueStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter object for creating a new issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssueData {
    /// Human-readable issue code.
    pub code: IssueCode,
    /// Owning project.
    pub project_id: ProjectId,
    /// Issue title.
    pub title: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Issue classification.
    pub issue_type: IssueType,
    /// Issue priority.
    pub priority: IssuePriority,
    /// Initial label set.
    pub labels: Vec<String>,
}

/// Parameter object for reconstructing a persisted issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedIssueData {
    /// Persisted issue identifier.
    pub id: IssueId,
    /// Persisted issue code.
    pub code: IssueCode,
    /// Persisted owning project.
    pub project_id: ProjectId,
    /// Persisted title.
    pub title: String,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted classification.
    pub issue_type: IssueType,
    /// Persisted priority.
    pub priority: IssuePriority,
    /// Persisted board column.
    pub status: IssueStatus,
    /// Persisted labels.
    pub labels: Vec<String>,
    /// Persisted assignee, if any.
    pub assignee: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Issue aggregate root.
///
/// The status field is the single source of truth the automation layer
/// watches; it is mutated only through [`Issue::set_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    id: IssueId,
    code: IssueCode,
    project_id: ProjectId,
    title: String,
    description: Option<String>,
    issue_type: IssueType,
    priority: IssuePriority,
    status: IssueStatus,
    labels: Vec<String>,
    assignee: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Issue {
    /// Creates a new issue in the [`IssueStatus::Todo`] column.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerDomainError::EmptyIssueTitle`] when the title is
    /// empty after trimming.
    pub fn new(data: NewIssueData, clock: &impl Clock) -> Result<Self, TrackerDomainError> {
        let title = data.title.trim().to_owned();
        if title.is_empty() {
            return Err(TrackerDomainError::EmptyIssueTitle);
        }

        let timestamp = clock.utc();
        Ok(Self {
            id: IssueId::new(),
            code: data.code,
            project_id: data.project_id,
            title,
            description: data.description,
            issue_type: data.issue_type,
            priority: data.priority,
            status: IssueStatus::Todo,
            labels: data.labels,
            assignee: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs an issue from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedIssueData) -> Self {
        Self {
            id: data.id,
            code: data.code,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            issue_type: data.issue_type,
            priority: data.priority,
            status: data.status,
            labels: data.labels,
            assignee: data.assignee,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the issue identifier.
    #[must_use]
    pub const fn id(&self) -> IssueId {
        self.id
    }

    /// Returns the human-readable issue code.
    #[must_use]
    pub const fn code(&self) -> &IssueCode {
        &self.code
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the issue title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the issue description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the issue classification.
    #[must_use]
    pub const fn issue_type(&self) -> IssueType {
        self.issue_type
    }

    /// Returns the issue priority.
    #[must_use]
    pub const fn priority(&self) -> IssuePriority {
        self.priority
    }

    /// Returns the current board column.
    #[must_use]
    pub const fn status(&self) -> IssueStatus {
        self.status
    }

    /// Returns the label set.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Moves the issue to another board column.
    ///
    /// Any status may follow any other; the board enforces no transition
    /// graph of its own.
    pub fn set_status(&mut self, status: IssueStatus, clock: &impl Clock) {
        self.status = status;
        self.touch(clock);
    }

    /// Replaces the issue title.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerDomainError::EmptyIssueTitle`] when the title is
    /// empty after trimming.
    pub fn set_title(
        &mut self,
        title: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TrackerDomainError> {
        let normalized = title.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(TrackerDomainError::EmptyIssueTitle);
        }
        self.title = normalized;
        self.touch(clock);
        Ok(())
    }

    /// Replaces the issue description, or clears it with `None`.
    pub fn set_description(&mut self, description: Option<String>, clock: &impl Clock) {
        self.description = description;
        self.touch(clock);
    }

    /// Changes the issue priority.
    pub fn set_priority(&mut self, priority: IssuePriority, clock: &impl Clock) {
        self.priority = priority;
        self.touch(clock);
    }

    /// Assigns the issue to a user, or clears the assignee with `None`.
    pub fn assign(&mut self, assignee: Option<String>, clock: &impl Clock) {
        self.assignee = assignee;
        self.touch(clock);
    }

    /// Adds a label if not already present.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerDomainError::EmptyLabel`] when the label is empty
    /// after trimming.
    pub fn add_label(
        &mut self,
        label: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TrackerDomainError> {
        let normalized = label.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(TrackerDomainError::EmptyLabel);
        }
        if !self.labels.contains(&normalized) {
            self.labels.push(normalized);
            self.touch(clock);
        }
        Ok(())
    }

    /// Removes a label if present.
    pub fn remove_label(&mut self, label: &str, clock: &impl Clock) {
        let before = self.labels.len();
        self.labels.retain(|existing| existing != label);
        if self.labels.len() != before {
            self.touch(clock);
        }
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
