// src/results/report.rs

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::errors::TaskError;
use crate::results::collector::StatusCounts;
use crate::task::TaskResult;
use crate::types::{ResultKind, TaskId};

/// A task body that returned an error or panicked.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub task: TaskId,
    pub error: Arc<TaskError>,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Result per task id.
    pub results: HashMap<TaskId, TaskResult>,
    /// Errors raised by task bodies, in the order they were observed.
    pub task_errors: Vec<TaskFailure>,
    /// False when the run was interrupted before every task was terminal.
    pub completed: bool,
}

impl RunReport {
    /// Result for `task`; `NotExecuted` if the id is unknown.
    pub fn result(&self, task: &str) -> TaskResult {
        self.results.get(task).cloned().unwrap_or_default()
    }

    pub fn kind_of(&self, task: &str) -> ResultKind {
        self.results
            .get(task)
            .map(|r| r.kind())
            .unwrap_or_default()
    }

    pub fn counts(&self) -> StatusCounts {
        self.results.values().map(|r| r.kind()).collect()
    }

    /// True when the run completed and every task succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.completed && self.results.values().all(|r| r.succeeded())
    }

    /// Ids with the given kind, sorted.
    pub fn ids_with(&self, kind: ResultKind) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .results
            .iter()
            .filter(|(_, r)| r.kind() == kind)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Human-readable status of every task, sorted by id.
    pub fn render_status(&self) -> String {
        let mut ids: Vec<&TaskId> = self.results.keys().collect();
        ids.sort_unstable();

        let mut out = String::new();
        for id in ids {
            let _ = writeln!(out, "id: [{id}]\n\t Task Status: {}", self.results[id]);
        }
        let _ = writeln!(out, "{}", self.counts());
        if !self.completed {
            out.push_str("run interrupted before all tasks finished\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        let mut results = HashMap::new();
        results.insert("B".to_string(), TaskResult::skipped());
        results.insert(
            "A".to_string(),
            TaskResult::failed(TaskError::NonZeroExit { code: 2 }),
        );
        RunReport {
            results,
            task_errors: Vec::new(),
            completed: true,
        }
    }

    #[test]
    fn render_status_lists_tasks_in_id_order() {
        let text = report().render_status();
        let a = text.find("id: [A]").unwrap();
        let b = text.find("id: [B]").unwrap();
        assert!(a < b);
        assert!(text.contains("[ FAILED Process exited with code 2 ]"));
        assert!(text.contains("failed=1 skipped=1"));
        assert!(!text.contains("interrupted"));
    }

    #[test]
    fn queries_by_kind() {
        let r = report();
        assert_eq!(r.ids_with(ResultKind::Skipped), vec!["B".to_string()]);
        assert_eq!(r.kind_of("missing"), ResultKind::NotExecuted);
        assert!(!r.all_succeeded());
    }
}
