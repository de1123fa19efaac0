// src/exec/worker.rs

//! Execution of a single scheduled task on a worker thread.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::errors::TaskError;
use crate::exec::cancel::CancelSignal;
use crate::task::{ParentResult, Task, TaskResult};
use crate::types::TaskId;

/// A claimed task plus the results of its direct dependencies.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub task: Arc<dyn Task>,
    pub parents: Vec<ParentResult>,
}

/// Run one task to a terminal result. Blocks for the duration of the body.
///
/// `on_start` fires right before the body runs and is not called for
/// skipped or cancelled tasks. Errors and panics from the body become
/// `Failed` results.
pub fn run_scheduled(
    scheduled: &ScheduledTask,
    cancel: &CancelSignal,
    on_start: impl FnOnce(),
) -> TaskResult {
    let id = scheduled.id.as_str();
    let task = &scheduled.task;

    let proceed = catch_unwind(AssertUnwindSafe(|| task.should_execute(&scheduled.parents)));
    match proceed {
        Ok(true) => {}
        Ok(false) => {
            let blocked: Vec<&str> = scheduled
                .parents
                .iter()
                .filter(|p| !p.result.succeeded())
                .map(|p| p.id.as_str())
                .collect();
            info!(task = %id, ?blocked, "dependencies did not succeed; skipping");
            return TaskResult::skipped();
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            error!(task = %id, panic = %msg, "should_execute panicked");
            return TaskResult::failed(TaskError::Panicked(msg));
        }
    }

    if cancel.is_cancelled() {
        info!(task = %id, "pool shut down before task started");
        return TaskResult::failed(TaskError::Cancelled);
    }

    on_start();
    let started = Instant::now();
    info!(task = %id, "task started");

    let outcome = catch_unwind(AssertUnwindSafe(|| task.execute_cancellable(cancel)));
    let elapsed = started.elapsed();

    let result = match outcome {
        Ok(Ok(result)) if result.is_terminal() => result,
        Ok(Ok(result)) => {
            warn!(task = %id, kind = %result.kind(), "task returned a non-terminal result");
            TaskResult::failed(TaskError::Execution(format!(
                "task returned non-terminal result {}",
                result.kind()
            )))
        }
        Ok(Err(err)) => {
            error!(task = %id, error = %err, "task failed");
            TaskResult::failed(err)
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            error!(task = %id, panic = %msg, "task panicked");
            TaskResult::failed(TaskError::Panicked(msg))
        }
    };

    info!(task = %id, kind = %result.kind(), ?elapsed, "task finished");
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
