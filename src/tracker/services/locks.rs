//! Per-issue mutation locks.

use crate::tracker::domain::IssueId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serialises mutations of a single issue across concurrent callers.
///
/// A manual status change and an automatic move racing on the same issue
/// both take the issue's lock, so each one observes the state the other
/// left behind rather than interleaving between read and write. Locks are
/// allocated lazily per issue and shared by every clone of the set.
#[derive(Debug, Clone, Default)]
pub struct IssueMutationLocks {
    locks: Arc<Mutex<HashMap<IssueId, Arc<Mutex<()>>>>>,
}

impl IssueMutationLocks {
    /// Creates an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for an issue, creating it on first use.
    ///
    /// The guard is owned so it can be held across await points.
    pub async fn acquire(&self, issue_id: IssueId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(issue_id).or_default())
        };
        lock.lock_owned().await
    }
}
