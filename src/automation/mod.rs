//! Automation wiring between the tracker and the execution engine.
//!
//! Two reactive components close the loop: the status-transition
//! orchestrator listens for issues entering `IN_PROGRESS` and starts agent
//! runs, and the completion handler listens for runs finishing and moves
//! issues onward. Both run on detached tasks, log their own failures, and
//! never propagate errors to the operation that triggered them. The handler
//! writes through the repositories, never back through the orchestrator, so
//! an automatic move cannot start a second run.

mod completion;
mod orchestrator;
pub mod workflow;

pub use completion::CompletionHandler;
pub use orchestrator::StatusTransitionOrchestrator;

#[cfg(test)]
mod tests;
