//! Service layer for issue and project lifecycle operations.

use crate::realtime::{Broadcaster, RealtimeEvent, Topic};
use crate::tracker::{
    domain::{
        AutomationConfig, Issue, IssueCode, IssueId, IssuePriority, IssueStatus, IssueType,
        NewIssueData, Project, ProjectId, ProjectKey, TrackerDomainError,
    },
    ports::{
        IssueRepository, IssueRepositoryError, NoopStatusObserver, ProjectRepository,
        ProjectRepositoryError, StatusChangeObserver,
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

use super::IssueMutationLocks;

/// Request payload for creating an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIssueRequest {
    project_id: ProjectId,
    title: String,
    description: Option<String>,
    issue_type: IssueType,
    priority: IssuePriority,
    labels: Vec<String>,
}

impl CreateIssueRequest {
    /// Creates a request with required issue fields.
    ///
    /// Priority defaults to [`IssuePriority::Medium`].
    #[must_use]
    pub fn new(project_id: ProjectId, title: impl Into<String>, issue_type: IssueType) -> Self {
        Self {
            project_id,
            title: title.into(),
            description: None,
            issue_type,
            priority: IssuePriority::Medium,
            labels: Vec::new(),
        }
    }

    /// Sets the issue description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the issue priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the initial label set.
    #[must_use]
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }
}

/// Request payload for editing an issue's descriptive fields.
///
/// Absent fields are left untouched; the board column and assignee have
/// their own operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateIssueRequest {
    title: Option<String>,
    description: Option<String>,
    priority: Option<IssuePriority>,
}

impl UpdateIssueRequest {
    /// Creates an empty request touching nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the issue title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the issue description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Changes the issue priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: IssuePriority) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Service-level errors for issue lifecycle operations.
#[derive(Debug, Error)]
pub enum IssueLifecycleError {
    /// The issue was not found.
    #[error("issue not found: {0}")]
    IssueNotFound(IssueId),

    /// The owning project was not found.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TrackerDomainError),

    /// Issue repository operation failed.
    #[error(transparent)]
    Issues(#[from] IssueRepositoryError),

    /// Project repository operation failed.
    #[error(transparent)]
    Projects(#[from] ProjectRepositoryError),
}

/// Result type for issue lifecycle service operations.
pub type IssueLifecycleResult<T> = Result<T, IssueLifecycleError>;

/// Issue lifecycle orchestration service.
///
/// The status-change operation is the automation trigger: after the new
/// status is persisted and broadcast, the configured observer is invoked on
/// a detached task so automation can never fail or delay the caller.
pub struct IssueLifecycleService<I, P, C>
where
    I: IssueRepository + 'static,
    P: ProjectRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    issues: Arc<I>,
    projects: Arc<P>,
    clock: Arc<C>,
    broadcaster: Arc<Broadcaster>,
    observer: Arc<dyn StatusChangeObserver>,
    locks: IssueMutationLocks,
}

impl<I, P, C> Clone for IssueLifecycleService<I, P, C>
where
    I: IssueRepository + 'static,
    P: ProjectRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            issues: Arc::clone(&self.issues),
            projects: Arc::clone(&self.projects),
            clock: Arc::clone(&self.clock),
            broadcaster: Arc::clone(&self.broadcaster),
            observer: Arc::clone(&self.observer),
            locks: self.locks.clone(),
        }
    }
}

impl<I, P, C> IssueLifecycleService<I, P, C>
where
    I: IssueRepository + 'static,
    P: ProjectRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a lifecycle service with no automation observer.
    #[must_use]
    pub fn new(
        issues: Arc<I>,
        projects: Arc<P>,
        clock: Arc<C>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            issues,
            projects,
            clock,
            broadcaster,
            observer: Arc::new(NoopStatusObserver),
            locks: IssueMutationLocks::new(),
        }
    }

    /// Sets the observer invoked after each persisted status change.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StatusChangeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Shares an externally owned lock set.
    ///
    /// Automation that mutates issues on its own tasks must use the same
    /// set, otherwise its moves would not be serialised against manual ones.
    #[must_use]
    pub fn with_locks(mut self, locks: IssueMutationLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Returns the lock set serialising this service's issue mutations.
    #[must_use]
    pub fn locks(&self) -> IssueMutationLocks {
        self.locks.clone()
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError`] when validation fails or the project
    /// repository rejects persistence.
    pub async fn create_project(
        &self,
        key: ProjectKey,
        name: impl Into<String> + Send,
        automation: AutomationConfig,
    ) -> IssueLifecycleResult<Project> {
        let project = Project::new(key, name, automation, &*self.clock)?;
        self.projects.store(&project).await?;
        Ok(project)
    }

    /// Returns a project, or `None` for an unknown identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Projects`] on lookup failure.
    pub async fn get_project(&self, id: ProjectId) -> IssueLifecycleResult<Option<Project>> {
        Ok(self.projects.find_by_id(id).await?)
    }

    /// Creates an issue in the `TODO` column with the next free code.
    ///
    /// Codes are allocated from the project's monotone issue count, so the
    /// first issue of project `PROJ` is `PROJ-001`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::ProjectNotFound`] for an unknown
    /// project, and domain or repository errors otherwise.
    pub async fn create_issue(&self, request: CreateIssueRequest) -> IssueLifecycleResult<Issue> {
        let project = self
            .projects
            .find_by_id(request.project_id)
            .await?
            .ok_or(IssueLifecycleError::ProjectNotFound(request.project_id))?;

        let sequence = self.issues.count_by_project(project.id()).await? + 1;
        let code = IssueCode::from_sequence(project.key(), sequence);
        let issue = Issue::new(
            NewIssueData {
                code,
                project_id: project.id(),
                title: request.title,
                description: request.description,
                issue_type: request.issue_type,
                priority: request.priority,
                labels: request.labels,
            },
            &*self.clock,
        )?;
        self.issues.store(&issue).await?;

        self.broadcaster
            .publish(
                Topic::Global,
                &RealtimeEvent::IssueCreated {
                    issue_id: issue.id(),
                    code: issue.code().clone(),
                },
            )
            .await;
        Ok(issue)
    }

    /// Returns an issue, or `None` for an unknown identifier.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Issues`] on lookup failure.
    pub async fn get_issue(&self, id: IssueId) -> IssueLifecycleResult<Option<Issue>> {
        Ok(self.issues.find_by_id(id).await?)
    }

    /// Returns an issue by its human-readable code.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Issues`] on lookup failure.
    pub async fn get_issue_by_code(
        &self,
        code: &IssueCode,
    ) -> IssueLifecycleResult<Option<Issue>> {
        Ok(self.issues.find_by_code(code).await?)
    }

    /// Returns a project's issues, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::Issues`] on lookup failure.
    pub async fn list_issues(&self, project_id: ProjectId) -> IssueLifecycleResult<Vec<Issue>> {
        Ok(self.issues.list_by_project(project_id).await?)
    }

    /// Edits an issue's descriptive fields.
    ///
    /// Runs under the issue's mutation lock and broadcasts `issue:updated`
    /// after persisting. Status changes go through
    /// [`IssueLifecycleService::update_status`] so automation triggers
    /// exactly there.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::IssueNotFound`] for an unknown issue,
    /// domain validation errors, and repository errors otherwise.
    pub async fn update_issue(
        &self,
        issue_id: IssueId,
        request: UpdateIssueRequest,
    ) -> IssueLifecycleResult<Issue> {
        let issue = {
            let _guard = self.locks.acquire(issue_id).await;
            let mut issue = self
                .issues
                .find_by_id(issue_id)
                .await?
                .ok_or(IssueLifecycleError::IssueNotFound(issue_id))?;
            if let Some(title) = request.title {
                issue.set_title(title, &*self.clock)?;
            }
            if let Some(description) = request.description {
                issue.set_description(Some(description), &*self.clock);
            }
            if let Some(priority) = request.priority {
                issue.set_priority(priority, &*self.clock);
            }
            self.issues.update(&issue).await?;
            issue
        };

        self.broadcaster
            .publish(Topic::Global, &RealtimeEvent::IssueUpdated { issue_id })
            .await;
        Ok(issue)
    }

    /// Removes an issue from its board.
    ///
    /// The freed issue code is never reallocated: code allocation draws from
    /// the project's monotone counter, not from the live issue set.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::IssueNotFound`] for an unknown issue
    /// and repository errors otherwise.
    pub async fn delete_issue(&self, issue_id: IssueId) -> IssueLifecycleResult<()> {
        {
            let _guard = self.locks.acquire(issue_id).await;
            self.issues.delete(issue_id).await.map_err(|err| match err {
                IssueRepositoryError::NotFound(id) => IssueLifecycleError::IssueNotFound(id),
                other => IssueLifecycleError::Issues(other),
            })?;
        }

        self.broadcaster
            .publish(Topic::Global, &RealtimeEvent::IssueDeleted { issue_id })
            .await;
        Ok(())
    }

    /// Moves an issue to another board column.
    ///
    /// The read-modify-write runs under the issue's mutation lock. Moving an
    /// issue to the column it is already in is a no-op: nothing is persisted,
    /// no event is broadcast, and automation does not trigger.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::IssueNotFound`] for an unknown issue
    /// and repository errors otherwise.
    pub async fn update_status(
        &self,
        issue_id: IssueId,
        new_status: IssueStatus,
    ) -> IssueLifecycleResult<Issue> {
        let (issue, old_status) = {
            let _guard = self.locks.acquire(issue_id).await;
            let mut issue = self
                .issues
                .find_by_id(issue_id)
                .await?
                .ok_or(IssueLifecycleError::IssueNotFound(issue_id))?;
            if issue.status() == new_status {
                return Ok(issue);
            }
            let old_status = issue.status();
            issue.set_status(new_status, &*self.clock);
            self.issues.update(&issue).await?;
            (issue, old_status)
        };

        self.broadcaster
            .publish(
                Topic::Global,
                &RealtimeEvent::IssueStatusChanged {
                    issue_id,
                    status: new_status,
                    old_status,
                    auto_moved: false,
                },
            )
            .await;

        let observer = Arc::clone(&self.observer);
        let observed = issue.clone();
        tokio::spawn(async move {
            observer
                .status_changed(&observed, old_status, new_status)
                .await;
        });

        Ok(issue)
    }

    /// Assigns an issue to a user, or clears the assignee with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueLifecycleError::IssueNotFound`] for an unknown issue
    /// and repository errors otherwise.
    pub async fn assign(
        &self,
        issue_id: IssueId,
        assignee: Option<String>,
    ) -> IssueLifecycleResult<Issue> {
        let issue = {
            let _guard = self.locks.acquire(issue_id).await;
            let mut issue = self
                .issues
                .find_by_id(issue_id)
                .await?
                .ok_or(IssueLifecycleError::IssueNotFound(issue_id))?;
            issue.assign(assignee, &*self.clock);
            self.issues.update(&issue).await?;
            issue
        };

        self.broadcaster
            .publish(
                Topic::Global,
                &RealtimeEvent::IssueAssigned {
                    issue_id,
                    assignee: issue.assignee().map(str::to_owned),
                },
            )
            .await;
        Ok(issue)
    }
}
