//! Issue and project tracking.
//!
//! This module owns the records the automation layer acts on: projects with
//! their per-project automation configuration, and issues moving across
//! board columns. The status-change operation on the lifecycle service is
//! the single automation trigger. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
