// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the [`WorkerPool`] trait and the production
//!   [`BlockingWorkerPool`].
//! - [`worker`] runs one scheduled task: dependency check, body, panic and
//!   error capture.
//! - [`command`] runs external programs for process-backed task types.
//! - [`cancel`] lets a shut-down pool stop bodies that are still running.

pub mod backend;
pub mod cancel;
pub mod command;
pub mod worker;

pub use backend::{BlockingWorkerPool, WorkerPool};
pub use cancel::{CancelSignal, CancelSource};
pub use command::ExternalCommand;
pub use worker::{run_scheduled, ScheduledTask};
