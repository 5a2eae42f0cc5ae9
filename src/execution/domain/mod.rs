//! Domain model for agent execution lifecycles.
//!
//! An execution is one run of the automated processing pipeline against a
//! specific issue. Executions are never deleted or reused: a retry creates
//! a new record and leaves the original untouched.

mod error;
mod execution;
mod ids;

pub use error::{ExecutionDomainError, ParseExecutionStatusError};
pub use execution::{Execution, ExecutionStatus, LogEntry, RunReport};
pub use ids::{ExecutionId, JobId};
