//! Error types for the execution domain.

use super::{ExecutionId, ExecutionStatus};
use thiserror::Error;

/// Errors returned while mutating execution aggregates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionDomainError {
    /// The requested lifecycle transition is not permitted.
    #[error("invalid execution transition for {execution_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Execution being mutated.
        execution_id: ExecutionId,
        /// Current lifecycle state.
        from: ExecutionStatus,
        /// Requested lifecycle state.
        to: ExecutionStatus,
    },

    /// Progress may only move forward while running.
    #[error("progress for {execution_id} may not decrease: {from} -> {to}")]
    ProgressNotMonotonic {
        /// Execution being mutated.
        execution_id: ExecutionId,
        /// Previously recorded progress.
        from: u8,
        /// Requested progress.
        to: u8,
    },

    /// Intermediate progress must stay below 100; only completion reaches it.
    #[error("progress {0} out of range, expected 1-99")]
    ProgressOutOfRange(u8),

    /// The prompt is empty after trimming.
    #[error("execution prompt must not be empty")]
    EmptyPrompt,
}

/// Error returned while parsing execution statuses from storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown execution status: {0}")]
pub struct ParseExecutionStatusError(pub String);
