//! Adapter implementations of the execution ports.

mod memory;
mod schedule;

pub use memory::{DEFAULT_CAPACITY, InMemoryExecutionRegistry};
pub use schedule::{DEFAULT_STEP_DELAY, DEFAULT_STEPS, FixedScheduleSource};
