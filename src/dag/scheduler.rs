// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state::TaskState;
use crate::types::{ResultKind, TaskId};

/// Pure, synchronous scheduling state machine for one run.
///
/// It owns the dependency graph plus a [`TaskState`] per task and decides
/// which tasks may be dispatched. It never runs anything itself; the caller
/// dispatches the ids returned in each [`SchedulerStep`] and reports back
/// through [`Scheduler::handle_completion`].
///
/// A task is only returned once. Claiming (`Eligible → Running`) happens
/// inside the step that returns it, so a caller that serializes calls
/// cannot dispatch a task twice.
#[derive(Debug)]
pub struct Scheduler {
    graph: DependencyGraph,
    states: HashMap<TaskId, TaskState>,
    started: bool,
}

impl Scheduler {
    /// Every task starts `Pending` except roots, which start `Eligible`.
    pub fn new(graph: DependencyGraph) -> Self {
        let states = graph
            .task_ids()
            .map(|id| {
                let state = if graph.dependencies_of(id).is_empty() {
                    TaskState::Eligible
                } else {
                    TaskState::Pending
                };
                (id.to_string(), state)
            })
            .collect();

        Self {
            graph,
            states,
            started: false,
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn state_of(&self, id: &str) -> Option<TaskState> {
        self.states.get(id).copied()
    }

    /// Whether every dependency of `id` is terminal. `None` for unknown ids.
    pub fn deps_satisfied(&self, id: &str) -> Option<bool> {
        if !self.states.contains_key(id) {
            return None;
        }
        Some(
            self.graph
                .dependencies_of(id)
                .iter()
                .all(|dep| self.state_of(dep).is_some_and(TaskState::is_terminal)),
        )
    }

    /// True once no task is `Pending`, `Eligible` or `Running`.
    pub fn is_finished(&self) -> bool {
        self.states.values().all(|s| s.is_terminal())
    }

    /// Ids of tasks that are not terminal, sorted.
    pub fn unfinished(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .states
            .iter()
            .filter(|(_, s)| !s.is_terminal())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Claim all initially eligible tasks (the roots).
    ///
    /// Calling this twice is a no-op the second time.
    pub fn start(&mut self) -> SchedulerStep {
        if self.started {
            warn!("scheduler already started; ignoring");
            return SchedulerStep::default();
        }
        self.started = true;

        let mut ready: Vec<TaskId> = self
            .states
            .iter()
            .filter(|(_, s)| **s == TaskState::Eligible)
            .map(|(id, _)| id.clone())
            .collect();
        ready.sort_unstable();
        self.claim_all(&ready);

        info!(tasks = self.states.len(), roots = ready.len(), "scheduler started");
        SchedulerStep {
            run_just_finished: self.is_finished(),
            newly_ready: ready,
        }
    }

    /// Record a task's terminal outcome and claim any dependents that are
    /// now eligible.
    ///
    /// Reports for tasks that are not `Running` (unknown, never dispatched,
    /// or already terminal) are ignored, as are non-terminal kinds.
    pub fn handle_completion(&mut self, id: &str, outcome: ResultKind) -> SchedulerStep {
        let Some(next) = TaskState::from_outcome(outcome) else {
            warn!(task = %id, %outcome, "completion with non-terminal outcome; ignoring");
            return SchedulerStep::default();
        };

        match self.states.get_mut(id) {
            Some(state) if *state == TaskState::Running => {
                debug!(task = %id, from = %state, to = %next, "task finished");
                *state = next;
            }
            Some(state) => {
                warn!(task = %id, state = %state, %outcome, "completion for task that is not running; ignoring");
                return SchedulerStep::default();
            }
            None => {
                warn!(task = %id, "completion for unknown task; ignoring");
                return SchedulerStep::default();
            }
        }

        let mut ready: Vec<TaskId> = Vec::new();
        for dependent in self.graph.dependents_of(id) {
            if self.state_of(dependent) != Some(TaskState::Pending) {
                continue;
            }
            if self.deps_satisfied(dependent) == Some(true) {
                ready.push(dependent.clone());
            }
        }
        ready.sort_unstable();
        for dependent in &ready {
            self.set_state(dependent, TaskState::Eligible);
        }
        self.claim_all(&ready);

        let run_just_finished = self.is_finished();
        if run_just_finished {
            info!("scheduler: all tasks terminal");
        }

        SchedulerStep {
            newly_ready: ready,
            run_just_finished,
        }
    }

    fn claim_all(&mut self, ids: &[TaskId]) {
        for id in ids {
            debug!(task = %id, "claimed for dispatch");
            self.set_state(id, TaskState::Running);
        }
    }

    fn set_state(&mut self, id: &str, state: TaskState) {
        if let Some(slot) = self.states.get_mut(id) {
            *slot = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{FileTask, ManualTaskBuilder, TaskRegistry};

    fn scheduler(specs: &[(&str, &[&str])]) -> Scheduler {
        let builder = specs.iter().fold(ManualTaskBuilder::new(), |b, (id, deps)| {
            b.with_task(FileTask::dummy(id, deps))
        });
        let registry = TaskRegistry::build(&builder).unwrap();
        Scheduler::new(DependencyGraph::build(&registry).unwrap())
    }

    #[test]
    fn roots_are_claimed_on_start() {
        let mut s = scheduler(&[("A", &[]), ("B", &[]), ("C", &["A", "B"])]);
        assert_eq!(s.state_of("A"), Some(TaskState::Eligible));
        assert_eq!(s.state_of("C"), Some(TaskState::Pending));

        let step = s.start();
        assert_eq!(step.newly_ready, vec!["A".to_string(), "B".to_string()]);
        assert!(!step.run_just_finished);
        assert_eq!(s.state_of("A"), Some(TaskState::Running));
        assert_eq!(s.start(), SchedulerStep::default());
    }

    #[test]
    fn dependent_waits_for_every_dependency() {
        let mut s = scheduler(&[("A", &[]), ("B", &[]), ("C", &["A", "B"])]);
        s.start();

        let step = s.handle_completion("A", ResultKind::Success);
        assert!(step.newly_ready.is_empty());
        assert_eq!(s.deps_satisfied("C"), Some(false));

        let step = s.handle_completion("B", ResultKind::Failed);
        assert_eq!(step.newly_ready, vec!["C".to_string()]);
        assert_eq!(s.state_of("C"), Some(TaskState::Running));

        let step = s.handle_completion("C", ResultKind::Skipped);
        assert!(step.run_just_finished);
        assert!(s.is_finished());
    }

    #[test]
    fn stray_completions_are_ignored() {
        let mut s = scheduler(&[("A", &[]), ("B", &["A"])]);
        s.start();

        assert_eq!(s.handle_completion("B", ResultKind::Success), SchedulerStep::default());
        assert_eq!(s.handle_completion("nope", ResultKind::Success), SchedulerStep::default());
        assert_eq!(s.handle_completion("A", ResultKind::Running), SchedulerStep::default());
        assert_eq!(s.state_of("B"), Some(TaskState::Pending));

        s.handle_completion("A", ResultKind::Success);
        let again = s.handle_completion("A", ResultKind::Failed);
        assert_eq!(again, SchedulerStep::default());
        assert_eq!(s.state_of("A"), Some(TaskState::Succeeded));
    }

    #[test]
    fn empty_graph_finishes_immediately() {
        let mut s = scheduler(&[]);
        let step = s.start();
        assert!(step.newly_ready.is_empty());
        assert!(step.run_just_finished);
    }

    #[test]
    fn unfinished_lists_non_terminal_tasks() {
        let mut s = scheduler(&[("A", &[]), ("B", &["A"])]);
        s.start();
        assert_eq!(s.unfinished(), vec!["A".to_string(), "B".to_string()]);
        s.handle_completion("A", ResultKind::Success);
        assert_eq!(s.unfinished(), vec!["B".to_string()]);
    }
}
