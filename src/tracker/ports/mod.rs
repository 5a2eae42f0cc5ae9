//! Port contracts for the tracker module.

mod observer;
mod repository;

pub use observer::{NoopStatusObserver, StatusChangeObserver};
pub use repository::{
    IssueRepository, IssueRepositoryError, IssueRepositoryResult, ProjectRepository,
    ProjectRepositoryError, ProjectRepositoryResult,
};
