//! Unit tests for the automation module.
