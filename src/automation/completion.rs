//! Reaction to terminal executions: finish notifications and auto-move.

use crate::execution::domain::Execution;
use crate::execution::ports::CompletionHook;
use crate::notify::{NotificationGateway, WebhookTransport};
use crate::realtime::{Broadcaster, RealtimeEvent, Topic};
use crate::tracker::domain::{Issue, IssueStatus, WebhookUrl};
use crate::tracker::ports::{IssueRepository, ProjectRepository};
use crate::tracker::services::IssueMutationLocks;
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reacts to executions reaching a terminal state.
///
/// Writes through the issue repository directly rather than through the
/// status-change operation: the auto-move must not re-trigger the
/// orchestrator. Every failure here is logged and swallowed.
pub struct CompletionHandler<I, P, T, C>
where
    I: IssueRepository + 'static,
    P: ProjectRepository + 'static,
    T: WebhookTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    issues: Arc<I>,
    projects: Arc<P>,
    gateway: NotificationGateway<T, C>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<C>,
    locks: IssueMutationLocks,
}

impl<I, P, T, C> CompletionHandler<I, P, T, C>
where
    I: IssueRepository + 'static,
    P: ProjectRepository + 'static,
    T: WebhookTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a completion handler.
    ///
    /// `locks` must be the same set the lifecycle service mutates issues
    /// under, otherwise the auto-move is not serialised against manual
    /// status changes.
    #[must_use]
    pub const fn new(
        issues: Arc<I>,
        projects: Arc<P>,
        gateway: NotificationGateway<T, C>,
        broadcaster: Arc<Broadcaster>,
        clock: Arc<C>,
        locks: IssueMutationLocks,
    ) -> Self {
        Self {
            issues,
            projects,
            gateway,
            broadcaster,
            clock,
            locks,
        }
    }

    /// Moves the issue to `REVIEW` if it is still in `IN_PROGRESS`.
    ///
    /// The re-read under the issue's mutation lock guards against a user
    /// having moved the issue elsewhere while the execution ran; a mismatch
    /// is a silent no-op.
    async fn auto_move_to_review(&self, issue: &Issue, webhook: Option<&WebhookUrl>) {
        let moved = {
            let _guard = self.locks.acquire(issue.id()).await;
            let mut current = match self.issues.find_by_id(issue.id()).await {
                Ok(Some(current)) => current,
                Ok(None) => {
                    debug!(issue = %issue.code(), "issue vanished before auto-move");
                    return;
                }
                Err(err) => {
                    warn!(issue = %issue.code(), error = %err, "issue re-read failed, skipping auto-move");
                    return;
                }
            };
            if current.status() != IssueStatus::InProgress {
                debug!(
                    issue = %current.code(),
                    status = %current.status(),
                    "issue moved away, skipping auto-move"
                );
                return;
            }
            current.set_status(IssueStatus::Review, &*self.clock);
            if let Err(err) = self.issues.update(&current).await {
                warn!(issue = %current.code(), error = %err, "auto-move persistence failed");
                return;
            }
            current
        };

        if let Err(err) = self.gateway.notify_auto_moved(webhook, &moved).await {
            warn!(issue = %moved.code(), error = %err, "auto-move notification failed");
        }
        self.broadcaster
            .publish(
                Topic::Global,
                &RealtimeEvent::IssueStatusChanged {
                    issue_id: moved.id(),
                    status: IssueStatus::Review,
                    old_status: IssueStatus::InProgress,
                    auto_moved: true,
                },
            )
            .await;
    }
}

#[async_trait]
impl<I, P, T, C> CompletionHook for CompletionHandler<I, P, T, C>
where
    I: IssueRepository + 'static,
    P: ProjectRepository + 'static,
    T: WebhookTransport + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn on_terminal(&self, execution: &Execution, success: bool) {
        let issue = match self.issues.find_by_id(execution.issue_id()).await {
            Ok(Some(issue)) => issue,
            Ok(None) => {
                debug!(execution = %execution.id(), "issue missing, skipping completion handling");
                return;
            }
            Err(err) => {
                warn!(execution = %execution.id(), error = %err, "issue lookup failed, skipping completion handling");
                return;
            }
        };
        let project = match self.projects.find_by_id(issue.project_id()).await {
            Ok(Some(project)) => project,
            Ok(None) => {
                debug!(issue = %issue.code(), "owning project missing, skipping completion handling");
                return;
            }
            Err(err) => {
                warn!(issue = %issue.code(), error = %err, "project lookup failed, skipping completion handling");
                return;
            }
        };

        let webhook = project.automation().slack_webhook_url();
        if let Err(err) = self
            .gateway
            .notify_execution_finished(webhook, &issue, execution, success)
            .await
        {
            warn!(issue = %issue.code(), error = %err, "finish notification failed");
        }

        if success && project.automation().auto_move_to_review() {
            self.auto_move_to_review(&issue, webhook).await;
        }
    }
}
