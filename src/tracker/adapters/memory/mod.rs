//! In-memory repository adapters for tests and single-process deployments.

mod issue;
mod project;

pub use issue::InMemoryIssueRepository;
pub use project::InMemoryProjectRepository;
