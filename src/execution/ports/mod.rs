//! Port contracts for the execution module.

mod hook;
mod progress;
mod registry;

pub use hook::{CompletionHook, NoopCompletionHook};
pub use progress::{ProgressSource, StepFailure, StepReport};
pub use registry::{ExecutionRegistry, ExecutionRegistryError, ExecutionRegistryResult};
