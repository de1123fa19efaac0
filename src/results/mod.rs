// src/results/mod.rs

//! Per-task results for a run.
//!
//! - [`collector`] is the shared, thread-safe store written by the runtime
//!   and read by the monitor.
//! - [`report`] is the final, owned view handed back to callers.

pub mod collector;
pub mod report;

pub use collector::{ResultCollector, StatusCounts, StatusSnapshot};
pub use report::{RunReport, TaskFailure};
