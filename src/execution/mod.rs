//! Agent execution runs and the engine that drives them.
//!
//! An execution is one agent run bound to an issue: it moves from pending
//! through running to exactly one terminal state, accumulating ordered log
//! lines and monotonic progress along the way. The engine orchestrates the
//! run loop; a progress source supplies the pace and a completion hook lets
//! downstream automation react to terminal outcomes.

pub mod adapters;
pub mod domain;
mod engine;
pub mod ports;

pub use engine::{
    DEFAULT_RUN_TIMEOUT, ExecutionEngine, ExecutionEngineError, ExecutionEngineResult,
    StartExecutionRequest,
};

#[cfg(test)]
mod tests;
