// src/dag/state.rs

//! Per-task scheduling state.

use std::fmt;

use crate::types::ResultKind;

/// Where a task is in its single pass through the scheduler.
///
/// `Pending → Eligible → Running → {Succeeded | Failed | Skipped}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// At least one dependency is not terminal yet.
    Pending,
    /// Every dependency is terminal; waiting to be claimed.
    Eligible,
    /// Claimed and handed to the worker pool.
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Skipped
        )
    }

    /// Terminal state for a reported outcome. Non-terminal kinds map to `None`.
    pub fn from_outcome(kind: ResultKind) -> Option<Self> {
        match kind {
            ResultKind::Success => Some(TaskState::Succeeded),
            ResultKind::Failed => Some(TaskState::Failed),
            ResultKind::Skipped => Some(TaskState::Skipped),
            ResultKind::NotExecuted | ResultKind::Running => None,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "pending",
            TaskState::Eligible => "eligible",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        };
        f.write_str(s)
    }
}
