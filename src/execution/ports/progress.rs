//! Progress source port: where an execution's forward motion comes from.

use crate::execution::domain::RunReport;
use async_trait::async_trait;
use thiserror::Error;

/// Report produced by one completed unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    /// Progress percentage after the step, 1-100.
    pub progress: u8,
    /// Log line describing the step.
    pub log: String,
}

/// Failure raised by a unit of work.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct StepFailure(pub String);

/// Source of progress for a run.
///
/// The engine's state machine is agnostic to where progress comes from: a
/// fixed timer schedule, callbacks from a live agent session, or a test
/// double all implement this contract. Steps are awaited sequentially, so a
/// source never sees two concurrent `await_step` calls for the same run.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    /// Number of steps a run takes to finish.
    fn total_steps(&self) -> u32;

    /// Waits for the given 1-based step to finish.
    ///
    /// # Errors
    ///
    /// Returns [`StepFailure`] when the unit of work fails; the engine
    /// marks the execution failed and stops advancing.
    async fn await_step(&self, step: u32) -> Result<StepReport, StepFailure>;

    /// Result payload attached when the final step completes.
    fn final_report(&self) -> RunReport;
}
