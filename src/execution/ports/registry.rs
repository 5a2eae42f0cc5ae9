//! Registry port for execution persistence and lookup.

use crate::execution::domain::{Execution, ExecutionId};
use crate::tracker::domain::IssueId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for execution registry operations.
pub type ExecutionRegistryResult<T> = Result<T, ExecutionRegistryError>;

/// Execution persistence contract.
///
/// Executions accumulate: they are stored on start, updated in place as the
/// engine drives them, and never removed by callers. Implementations are
/// expected to bound their capacity rather than grow without limit.
#[async_trait]
pub trait ExecutionRegistry: Send + Sync {
    /// Stores a new execution.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionRegistryError::DuplicateExecution`] when the ID
    /// already exists, or [`ExecutionRegistryError::CapacityExhausted`] when
    /// the registry is full of live executions.
    async fn store(&self, execution: &Execution) -> ExecutionRegistryResult<()>;

    /// Persists changes to an existing execution.
    ///
    /// Terminal records are immutable: once the stored execution has reached
    /// a terminal state, no further write may replace it. This is what makes
    /// a concurrent cancellation stick against an in-flight run loop holding
    /// a stale running snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionRegistryError::NotFound`] when the execution does
    /// not exist, or [`ExecutionRegistryError::AlreadyTerminal`] when the
    /// stored record is terminal.
    async fn update(&self, execution: &Execution) -> ExecutionRegistryResult<()>;

    /// Finds an execution by identifier.
    ///
    /// Returns `None` when the execution does not exist.
    async fn find_by_id(&self, id: ExecutionId) -> ExecutionRegistryResult<Option<Execution>>;

    /// Returns all executions bound to the given issue, oldest first.
    async fn find_by_issue(&self, issue_id: IssueId) -> ExecutionRegistryResult<Vec<Execution>>;
}

/// Errors returned by execution registry implementations.
#[derive(Debug, Clone, Error)]
pub enum ExecutionRegistryError {
    /// An execution with the same identifier already exists.
    #[error("duplicate execution identifier: {0}")]
    DuplicateExecution(ExecutionId),

    /// The execution was not found.
    #[error("execution not found: {0}")]
    NotFound(ExecutionId),

    /// The stored execution is already terminal and cannot be overwritten.
    #[error("execution already terminal: {0}")]
    AlreadyTerminal(ExecutionId),

    /// The registry is at capacity and every held execution is still live.
    #[error("execution registry at capacity ({0})")]
    CapacityExhausted(usize),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ExecutionRegistryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
