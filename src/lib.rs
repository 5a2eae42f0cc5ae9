//! Niemeyer: issue tracking automation core.
//!
//! This crate implements the automation backbone of an issue tracker: a
//! status change on an issue drives webhook notifications, optionally starts
//! an agent execution, and (when that execution succeeds) optionally moves
//! the issue to review.
//!
//! # Architecture
//!
//! Niemeyer follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (in-memory stores,
//!   HTTP webhook delivery, timer-driven progress)
//!
//! # Modules
//!
//! - [`tracker`]: Issue and project records, repositories, and the status
//!   change entry point
//! - [`execution`]: Execution lifecycle state machine and engine
//! - [`notify`]: Webhook notification gateway
//! - [`realtime`]: Topic-based event broadcasting
//! - [`automation`]: Status-transition orchestration and workflow dispatch

pub mod automation;
pub mod execution;
pub mod notify;
pub mod realtime;
pub mod tracker;
