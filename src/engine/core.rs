// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated scheduler state and result store
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events from the channel and handing tasks to the worker pool. Every
//! scheduler transition and every result write happens here, on whichever
//! single task drives the core, so a task can only be claimed once.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    build_scheduled, handle_task_finished, handle_task_started, CoreCommand, CoreStep,
};
use crate::engine::RuntimeEvent;
use crate::results::{ResultCollector, RunReport, TaskFailure};
use crate::task::TaskRegistry;

#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    registry: Arc<TaskRegistry>,
    results: ResultCollector,
    task_errors: Vec<TaskFailure>,
    shutting_down: bool,
}

impl CoreRuntime {
    /// `results` should be shared with anything that wants to observe the
    /// run (e.g. the monitor). The core is its only writer.
    pub fn new(scheduler: Scheduler, registry: Arc<TaskRegistry>, results: ResultCollector) -> Self {
        Self {
            scheduler,
            registry,
            results,
            task_errors: Vec::new(),
            shutting_down: false,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn results(&self) -> &ResultCollector {
        &self.results
    }

    pub fn task_errors(&self) -> &[TaskFailure] {
        &self.task_errors
    }

    /// Whether every task has reached a terminal state.
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    /// Claim the roots and dispatch them.
    pub fn start(&mut self) -> CoreStep {
        let step = self.scheduler.start();
        let tasks = build_scheduled(&self.scheduler, &self.registry, &self.results, step.newly_ready);
        CoreStep::dispatch(tasks, !step.run_just_finished)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskStarted { task } => {
                handle_task_started(&self.scheduler, &self.results, task);
                CoreStep::idle(!self.shutting_down)
            }
            RuntimeEvent::TaskFinished { task, result } => {
                let ready = handle_task_finished(
                    &mut self.scheduler,
                    &self.registry,
                    &self.results,
                    &mut self.task_errors,
                    task,
                    result,
                );
                if self.shutting_down {
                    if !ready.is_empty() {
                        warn!(count = ready.len(), "shutting down; not dispatching newly ready tasks");
                    }
                    return CoreStep::idle(false);
                }
                CoreStep::dispatch(ready, !self.scheduler.is_finished())
            }
            RuntimeEvent::ShutdownRequested => {
                info!(unfinished = ?self.scheduler.unfinished(), "shutdown requested");
                self.shutting_down = true;
                CoreStep {
                    commands: vec![CoreCommand::ShutdownPool],
                    keep_running: false,
                }
            }
        }
    }

    /// Final report. `completed` is false if any task was left unfinished.
    pub fn into_report(self) -> RunReport {
        RunReport {
            results: self.results.all_results(),
            task_errors: self.task_errors,
            completed: self.scheduler.is_finished(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{DependencyGraph, TaskState};
    use crate::errors::TaskError;
    use crate::task::{FileTask, ManualTaskBuilder, TaskResult};
    use crate::types::ResultKind;

    fn core(specs: &[(&str, &[&str])]) -> CoreRuntime {
        let builder = specs.iter().fold(ManualTaskBuilder::new(), |b, (id, deps)| {
            b.with_task(FileTask::dummy(id, deps))
        });
        let registry = TaskRegistry::build(&builder).unwrap();
        let graph = DependencyGraph::build(&registry).unwrap();
        let results = ResultCollector::with_tasks(registry.sorted_ids());
        CoreRuntime::new(Scheduler::new(graph), Arc::new(registry), results)
    }

    fn finished(task: &str, result: TaskResult) -> RuntimeEvent {
        RuntimeEvent::TaskFinished {
            task: task.to_string(),
            result,
        }
    }

    #[test]
    fn chain_dispatches_one_task_per_step() {
        let mut c = core(&[("A", &[]), ("B", &["A"])]);

        let step = c.start();
        assert_eq!(step.dispatched_ids(), vec!["A"]);
        assert!(step.keep_running);

        c.step(RuntimeEvent::TaskStarted { task: "A".into() });
        assert_eq!(c.results().get_result("A").kind(), ResultKind::Running);

        let step = c.step(finished("A", TaskResult::success()));
        assert_eq!(step.dispatched_ids(), vec!["B"]);
        match &step.commands[0] {
            CoreCommand::DispatchTasks(tasks) => {
                assert_eq!(tasks[0].parents.len(), 1);
                assert!(tasks[0].parents[0].result.succeeded());
            }
            other => panic!("unexpected command {other:?}"),
        }

        let step = c.step(finished("B", TaskResult::success()));
        assert!(!step.keep_running);
        assert!(c.into_report().all_succeeded());
    }

    #[test]
    fn failure_is_reported_and_handed_to_dependents() {
        let mut c = core(&[("A", &[]), ("B", &["A"])]);
        c.start();

        let step = c.step(finished(
            "A",
            TaskResult::failed(TaskError::Execution("bad".into())),
        ));
        assert_eq!(c.task_errors().len(), 1);
        assert_eq!(c.task_errors()[0].task, "A");
        match &step.commands[0] {
            CoreCommand::DispatchTasks(tasks) => {
                assert_eq!(tasks[0].parents[0].result.kind(), ResultKind::Failed)
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn duplicate_finish_is_ignored() {
        let mut c = core(&[("A", &[]), ("B", &["A"])]);
        c.start();
        c.step(finished("A", TaskResult::success()));
        let again = c.step(finished("A", TaskResult::failed(TaskError::Execution("x".into()))));
        assert!(again.dispatched_ids().is_empty());
        assert_eq!(c.results().get_result("A").kind(), ResultKind::Success);
    }

    #[test]
    fn shutdown_leaves_running_tasks_and_marks_incomplete() {
        let mut c = core(&[("A", &[]), ("B", &["A"])]);
        c.start();
        c.step(RuntimeEvent::TaskStarted { task: "A".into() });

        let step = c.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
        assert!(matches!(step.commands[0], CoreCommand::ShutdownPool));

        assert_eq!(c.scheduler().state_of("A"), Some(TaskState::Running));
        let report = c.into_report();
        assert!(!report.completed);
        assert_eq!(report.kind_of("A"), ResultKind::Running);
        assert_eq!(report.kind_of("B"), ResultKind::NotExecuted);
    }

    #[test]
    fn empty_registry_finishes_on_start() {
        let mut c = core(&[]);
        let step = c.start();
        assert!(step.commands.is_empty());
        assert!(!step.keep_running);
        assert!(c.into_report().completed);
    }
}
