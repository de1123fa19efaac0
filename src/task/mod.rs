// src/task/mod.rs

//! Tasks and the collections that hold them.
//!
//! - [`Task`] is the single capability set every task type implements.
//! - [`result`] holds the immutable [`TaskResult`] value.
//! - [`registry`] holds the validated id → task mapping for one run.
//! - [`builder`] produces tasks (manually or from a directory).
//! - [`kinds`] maps task-type names to concrete task constructors.
//! - [`template`] renders task bodies before execution.

use std::fmt;

use crate::errors::TaskError;
use crate::exec::CancelSignal;
use crate::types::TaskId;

pub mod builder;
pub mod kinds;
pub mod registry;
pub mod result;
pub mod template;

pub use builder::{FileSystemTaskBuilder, ManualTaskBuilder, TaskBuilder};
pub use kinds::{FileTask, TaskKind, TaskTypeRegistry};
pub use registry::TaskRegistry;
pub use result::{ParentResult, ProcessOutput, TaskResult};

/// A unit of work with an id, a dependency list and a blocking body.
pub trait Task: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    /// Ids of the tasks that must reach a terminal state before this one may
    /// start. May be empty.
    fn dependencies(&self) -> &[TaskId];

    /// Run the task body. Blocks the calling worker for its full duration.
    ///
    /// `Ok` results may still be `Failed` (e.g. a process exiting non-zero).
    /// `Err` is recorded as `Failed` with the error attached and reported on
    /// the run's task-error list.
    fn execute(&self) -> Result<TaskResult, TaskError>;

    /// [`Task::execute`] for bodies that can stop early once `cancel` fires.
    /// The default ignores the signal and runs to completion.
    fn execute_cancellable(&self, cancel: &CancelSignal) -> Result<TaskResult, TaskError> {
        let _ = cancel;
        self.execute()
    }

    /// Decide whether the body should run given the results of all direct
    /// dependencies. Returning `false` finalizes the task as `Skipped`.
    fn should_execute(&self, parents: &[ParentResult]) -> bool {
        parents.iter().all(|p| p.result.succeeded())
    }
}
