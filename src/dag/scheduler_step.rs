// src/dag/scheduler_step.rs

//! Step-by-step result type for the scheduler.

use crate::types::TaskId;

/// What changed in a single scheduler step.
///
/// Tests use this to drive the DAG by hand and assert on each transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Tasks claimed (now `Running`) by this step, sorted by id. The caller
    /// must dispatch every one of them.
    pub newly_ready: Vec<TaskId>,
    /// Whether this step left every task terminal.
    pub run_just_finished: bool,
}
