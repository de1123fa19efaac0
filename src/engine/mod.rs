// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the shared result collector
//! - the main runtime event loop that reacts to:
//!   - task started / finished events from the worker pool
//!   - shutdown requests
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. [`runner`] wires both to a worker pool and a
//! monitor for a complete run.

use std::time::Duration;

use crate::config::RunnerConfig;
use crate::task::TaskResult;
use crate::types::TaskId;

/// Events flowing into the runtime from the worker pool and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A worker is about to invoke the task body.
    TaskStarted { task: TaskId },
    /// A task reached a terminal result (including `Skipped`).
    TaskFinished { task: TaskId, result: TaskResult },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Size of the worker pool; values below 1 are treated as 1.
    pub workers: usize,
    /// Monitor polling interval.
    pub monitor_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            monitor_interval: Duration::from_secs(10),
        }
    }
}

impl RunOptions {
    pub fn from_config(cfg: &RunnerConfig) -> Self {
        Self {
            workers: cfg.workers(),
            monitor_interval: cfg.monitor_interval(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }
}

pub mod core;
pub mod event_handlers;
pub mod runner;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runner::JobRunner;
pub use runtime::Runtime;
