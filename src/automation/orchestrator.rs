//! Orchestration of automation on issue status transitions.

use crate::automation::workflow;
use crate::execution::{ExecutionEngine, StartExecutionRequest};
use crate::execution::ports::ExecutionRegistry;
use crate::notify::{NotificationGateway, WebhookTransport};
use crate::tracker::domain::{Issue, IssueStatus, Project};
use crate::tracker::ports::{ProjectRepository, StatusChangeObserver};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reacts to persisted issue status changes.
///
/// Runs on a detached task after the triggering operation has returned, so
/// every failure here is logged and swallowed rather than surfaced to the
/// caller. Entering `IN_PROGRESS` on a project with auto-execution enabled
/// starts an agent run; all other transitions only notify.
pub struct StatusTransitionOrchestrator<P, T, R, C>
where
    P: ProjectRepository + 'static,
    T: WebhookTransport + 'static,
    R: ExecutionRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    projects: Arc<P>,
    gateway: NotificationGateway<T, C>,
    engine: ExecutionEngine<R, C>,
}

impl<P, T, R, C> StatusTransitionOrchestrator<P, T, R, C>
where
    P: ProjectRepository + 'static,
    T: WebhookTransport + 'static,
    R: ExecutionRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an orchestrator.
    #[must_use]
    pub const fn new(
        projects: Arc<P>,
        gateway: NotificationGateway<T, C>,
        engine: ExecutionEngine<R, C>,
    ) -> Self {
        Self {
            projects,
            gateway,
            engine,
        }
    }

    /// Starts an agent run for the issue and notifies about it.
    async fn auto_execute(&self, issue: &Issue, project: &Project) {
        let webhook = project.automation().slack_webhook_url();
        let request =
            StartExecutionRequest::new(issue.id(), workflow::prompt_for(issue)).auto_started();
        match self.engine.start(request).await {
            Ok(execution) => {
                if let Err(err) = self
                    .gateway
                    .notify_execution_started(webhook, issue, &execution)
                    .await
                {
                    warn!(issue = %issue.code(), error = %err, "start notification failed");
                }
            }
            Err(err) => {
                warn!(issue = %issue.code(), error = %err, "automatic execution start failed");
            }
        }
    }
}

#[async_trait]
impl<P, T, R, C> StatusChangeObserver for StatusTransitionOrchestrator<P, T, R, C>
where
    P: ProjectRepository + 'static,
    T: WebhookTransport + 'static,
    R: ExecutionRegistry + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn status_changed(
        &self,
        issue: &Issue,
        old_status: IssueStatus,
        new_status: IssueStatus,
    ) {
        let project = match self.projects.find_by_id(issue.project_id()).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                debug!(issue = %issue.code(), "owning project missing, skipping automation");
                return;
            }
            Err(err) => {
                warn!(issue = %issue.code(), error = %err, "project lookup failed, skipping automation");
                return;
            }
        };

        let webhook = project.automation().slack_webhook_url();
        if let Err(err) = self
            .gateway
            .notify_status_changed(webhook, issue, old_status, new_status)
            .await
        {
            warn!(issue = %issue.code(), error = %err, "status notification failed");
        }

        if new_status == IssueStatus::InProgress && project.automation().claude_auto_execute() {
            self.auto_execute(issue, &project).await;
        }
    }
}
