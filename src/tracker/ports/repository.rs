//! Repository ports for issue and project persistence and lookup.

use crate::tracker::domain::{Issue, IssueCode, IssueId, Project, ProjectId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for issue repository operations.
pub type IssueRepositoryResult<T> = Result<T, IssueRepositoryError>;

/// Issue persistence contract.
///
/// The automation layer depends only on this interface; the backing store
/// is swappable.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Stores a new issue.
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::DuplicateIssue`] when the issue ID
    /// already exists or [`IssueRepositoryError::DuplicateCode`] when the
    /// issue code is already taken.
    async fn store(&self, issue: &Issue) -> IssueRepositoryResult<()>;

    /// Persists changes to an existing issue (status, assignee, labels,
    /// timestamps).
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::NotFound`] when the issue does not
    /// exist.
    async fn update(&self, issue: &Issue) -> IssueRepositoryResult<()>;

    /// Removes an issue.
    ///
    /// # Errors
    ///
    /// Returns [`IssueRepositoryError::NotFound`] when the issue does not
    /// exist.
    async fn delete(&self, id: IssueId) -> IssueRepositoryResult<()>;

    /// Finds an issue by identifier.
    ///
    /// Returns `None` when the issue does not exist.
    async fn find_by_id(&self, id: IssueId) -> IssueRepositoryResult<Option<Issue>>;

    /// Finds an issue by its human-readable code.
    ///
    /// Returns `None` when no issue carries the code.
    async fn find_by_code(&self, code: &IssueCode) -> IssueRepositoryResult<Option<Issue>>;

    /// Returns all issues belonging to the given project.
    async fn list_by_project(&self, project_id: ProjectId) -> IssueRepositoryResult<Vec<Issue>>;

    /// Returns the number of issues ever stored for the given project.
    ///
    /// Used to allocate the next `KEY-NNN` issue code; the count never
    /// decreases, even if issues are later removed.
    async fn count_by_project(&self, project_id: ProjectId) -> IssueRepositoryResult<u64>;
}

/// Errors returned by issue repository implementations.
#[derive(Debug, Clone, Error)]
pub enum IssueRepositoryError {
    /// An issue with the same identifier already exists.
    #[error("duplicate issue identifier: {0}")]
    DuplicateIssue(IssueId),

    /// An issue with the same code already exists.
    #[error("duplicate issue code: {0}")]
    DuplicateCode(IssueCode),

    /// The issue was not found.
    #[error("issue not found: {0}")]
    NotFound(IssueId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl IssueRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Result type for project repository operations.
pub type ProjectRepositoryResult<T> = Result<T, ProjectRepositoryError>;

/// Project persistence contract.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a new project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::DuplicateProject`] when the project
    /// ID already exists.
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()>;

    /// Finds a project by identifier.
    ///
    /// Returns `None` when the project does not exist.
    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>>;
}

/// Errors returned by project repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProjectRepositoryError {
    /// A project with the same identifier already exists.
    #[error("duplicate project identifier: {0}")]
    DuplicateProject(ProjectId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProjectRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
