//! Completion hook port: what happens after a run reaches a terminal state.

use crate::execution::domain::Execution;
use async_trait::async_trait;

/// Callback invoked exactly once when a run completes or fails.
///
/// The hook fires after the last progress update and before the engine
/// considers the run's lifecycle closed. Caller-cancelled runs close
/// without invoking it: cancellation is already observable through the
/// cancel operation itself and must never feed the success path.
///
/// Implementations must not fail: whatever goes wrong inside a hook is its
/// own to log and swallow.
#[async_trait]
pub trait CompletionHook: Send + Sync {
    /// Reacts to a terminal execution.
    ///
    /// `success` is true iff the execution completed.
    async fn on_terminal(&self, execution: &Execution, success: bool);
}

/// Hook that ignores every terminal execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompletionHook;

#[async_trait]
impl CompletionHook for NoopCompletionHook {
    async fn on_terminal(&self, _execution: &Execution, _success: bool) {}
}
