// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, error, warn};

use crate::dag::{Scheduler, TaskState};
use crate::exec::ScheduledTask;
use crate::results::{ResultCollector, TaskFailure};
use crate::task::{ParentResult, TaskRegistry, TaskResult};
use crate::types::{ResultKind, TaskId};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Hand these tasks to the worker pool.
    DispatchTasks(Vec<ScheduledTask>),
    /// Stop accepting work; nothing queued may start.
    ShutdownPool,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn dispatch(tasks: Vec<ScheduledTask>, keep_running: bool) -> Self {
        let commands = if tasks.is_empty() {
            Vec::new()
        } else {
            vec![CoreCommand::DispatchTasks(tasks)]
        };
        Self {
            commands,
            keep_running,
        }
    }

    pub(crate) fn idle(keep_running: bool) -> Self {
        Self {
            commands: Vec::new(),
            keep_running,
        }
    }

    /// Ids of every task this step dispatches.
    pub fn dispatched_ids(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(tasks) => Some(tasks),
                CoreCommand::ShutdownPool => None,
            })
            .flatten()
            .map(|t| t.id.as_str())
            .collect()
    }
}

/// A worker is about to run the body of `task`.
pub fn handle_task_started(scheduler: &Scheduler, results: &ResultCollector, task: TaskId) {
    if scheduler.state_of(&task) != Some(TaskState::Running) {
        warn!(task = %task, "start reported for task that was not dispatched; ignoring");
        return;
    }
    results.record_result(&task, TaskResult::running());
}

/// A worker finished `task`. Records the result, updates the scheduler and
/// returns the dependents that became ready.
pub fn handle_task_finished(
    scheduler: &mut Scheduler,
    registry: &TaskRegistry,
    results: &ResultCollector,
    task_errors: &mut Vec<TaskFailure>,
    task: TaskId,
    result: TaskResult,
) -> Vec<ScheduledTask> {
    if scheduler.state_of(&task) != Some(TaskState::Running) {
        warn!(task = %task, kind = %result.kind(), "result for task that is not running; ignoring");
        return Vec::new();
    }

    let kind = result.kind();
    if kind == ResultKind::Failed {
        if let Some(cause) = result.shared_error() {
            error!(task = %task, error = %cause, "task error recorded");
            task_errors.push(TaskFailure {
                task: task.clone(),
                error: cause,
            });
        }
    }

    results.record_result(&task, result);
    let step = scheduler.handle_completion(&task, kind);
    debug!(task = %task, %kind, ready = ?step.newly_ready, "completion processed");

    build_scheduled(scheduler, registry, results, step.newly_ready)
}

/// Attach each claimed id's task and parent results.
pub fn build_scheduled(
    scheduler: &Scheduler,
    registry: &TaskRegistry,
    results: &ResultCollector,
    ids: Vec<TaskId>,
) -> Vec<ScheduledTask> {
    ids.into_iter()
        .filter_map(|id| {
            let Some(task) = registry.get(&id) else {
                error!(task = %id, "claimed task missing from registry");
                return None;
            };
            let parents = scheduler
                .graph()
                .dependencies_of(&id)
                .iter()
                .map(|dep| ParentResult {
                    id: dep.clone(),
                    result: results.get_result(dep),
                })
                .collect();
            Some(ScheduledTask {
                id,
                task: std::sync::Arc::clone(task),
                parents,
            })
        })
        .collect()
}
