//! Orchestration services for the issue tracker.

mod lifecycle;
mod locks;

pub use lifecycle::{
    CreateIssueRequest, IssueLifecycleError, IssueLifecycleResult, IssueLifecycleService,
    UpdateIssueRequest,
};
pub use locks::IssueMutationLocks;
