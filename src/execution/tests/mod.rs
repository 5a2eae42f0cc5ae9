//! Unit tests for the execution module.

mod engine_tests;
mod state_transition_tests;
