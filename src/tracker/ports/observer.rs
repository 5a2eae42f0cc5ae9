//! Automation trigger surface for issue status changes.

use crate::tracker::domain::{Issue, IssueStatus};
use async_trait::async_trait;

/// Observer invoked after an issue status change has been persisted.
///
/// The public status-change operation is the sole automation trigger; no
/// other mutation path invokes the observer. Implementations must never
/// fail the triggering operation: anything that goes wrong inside an
/// observer is its own to log and swallow.
#[async_trait]
pub trait StatusChangeObserver: Send + Sync {
    /// Reacts to a persisted status change.
    ///
    /// `issue` carries the new status; `old_status` is the column the issue
    /// left.
    async fn status_changed(&self, issue: &Issue, old_status: IssueStatus, new_status: IssueStatus);
}

/// Observer that ignores every status change.
///
/// Useful for wiring the lifecycle service without automation, and in
/// tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStatusObserver;

#[async_trait]
impl StatusChangeObserver for NoopStatusObserver {
    async fn status_changed(
        &self,
        _issue: &Issue,
        _old_status: IssueStatus,
        _new_status: IssueStatus,
    ) {
    }
}
