// src/results/collector.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{trace, warn};

use crate::task::TaskResult;
use crate::types::{ResultKind, TaskId};

/// Shared map of task id → latest [`TaskResult`].
///
/// Cloning yields another handle to the same store. Slots only move
/// forward: `NotExecuted → Running → terminal`. A write that would leave a
/// terminal slot, or move a running slot back to `NotExecuted`, is dropped
/// with a warning.
#[derive(Debug, Clone, Default)]
pub struct ResultCollector {
    inner: Arc<RwLock<HashMap<TaskId, TaskResult>>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A collector with a `NotExecuted` slot for every id, so snapshots list
    /// tasks that have not started yet.
    pub fn with_tasks<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        let map = ids
            .into_iter()
            .map(|id| (id.into(), TaskResult::not_executed()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Store `result` for `task`. Returns whether the write was accepted.
    pub fn record_result(&self, task: &str, result: TaskResult) -> bool {
        let mut map = self.write();
        let current = map.get(task).map(|r| r.kind()).unwrap_or_default();

        if current.is_terminal() {
            warn!(
                task = %task,
                %current,
                rejected = %result.kind(),
                "task result already final; ignoring write"
            );
            return false;
        }
        if current == ResultKind::Running && result.kind() == ResultKind::NotExecuted {
            warn!(task = %task, "refusing to reset a running task to NOT_EXECUTED");
            return false;
        }

        trace!(task = %task, from = %current, to = %result.kind(), "recorded result");
        map.insert(task.to_string(), result);
        true
    }

    /// Result for `task`; `NotExecuted` when unset or unknown.
    pub fn get_result(&self, task: &str) -> TaskResult {
        self.read().get(task).cloned().unwrap_or_default()
    }

    /// Copy of every stored result. No ordering guarantee.
    pub fn all_results(&self) -> HashMap<TaskId, TaskResult> {
        self.read().clone()
    }

    /// Lightweight `(id, kind)` copy for status display.
    pub fn snapshot(&self) -> StatusSnapshot {
        let mut entries: Vec<(TaskId, ResultKind)> = self
            .read()
            .iter()
            .map(|(id, r)| (id.clone(), r.kind()))
            .collect();
        entries.sort_unstable();
        StatusSnapshot { entries }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, TaskResult>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, TaskResult>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Point-in-time view of result kinds, sorted by task id.
///
/// May already be stale when read; it is only used for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    entries: Vec<(TaskId, ResultKind)>,
}

impl StatusSnapshot {
    pub fn entries(&self) -> &[(TaskId, ResultKind)] {
        &self.entries
    }

    pub fn kind_of(&self, task: &str) -> Option<ResultKind> {
        self.entries
            .iter()
            .find(|(id, _)| id == task)
            .map(|(_, k)| *k)
    }

    pub fn counts(&self) -> StatusCounts {
        self.entries.iter().map(|(_, kind)| *kind).collect()
    }
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, kind) in &self.entries {
            writeln!(f, "id: [{id}] status: [{kind}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub not_executed: usize,
    pub running: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.not_executed + self.running + self.success + self.failed + self.skipped
    }
}

impl FromIterator<ResultKind> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = ResultKind>>(kinds: I) -> Self {
        let mut counts = StatusCounts::default();
        for kind in kinds {
            match kind {
                ResultKind::NotExecuted => counts.not_executed += 1,
                ResultKind::Running => counts.running += 1,
                ResultKind::Success => counts.success += 1,
                ResultKind::Failed => counts.failed += 1,
                ResultKind::Skipped => counts.skipped += 1,
            }
        }
        counts
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "not_executed={} running={} success={} failed={} skipped={}",
            self.not_executed, self.running, self.success, self.failed, self.skipped
        )
    }
}
