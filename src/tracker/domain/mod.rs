//! Domain model for issue and project tracking.
//!
//! The tracker domain models issues, their board columns, and the
//! per-project automation configuration while keeping all infrastructure
//! concerns outside of the domain boundary.

mod error;
mod ids;
mod issue;
mod project;

pub use error::{
    ParseIssuePriorityError, ParseIssueStatusError, ParseIssueTypeError, TrackerDomainError,
};
pub use ids::{IssueCode, IssueId, ProjectId, ProjectKey};
pub use issue::{Issue, IssuePriority, IssueStatus, IssueType, NewIssueData, PersistedIssueData};
pub use project::{AutomationConfig, Project, WebhookUrl};
