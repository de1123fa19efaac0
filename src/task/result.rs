// src/task/result.rs

//! Immutable task results.

use std::fmt;
use std::sync::Arc;

use crate::errors::TaskError;
use crate::types::{ResultKind, TaskId};

/// Metadata captured from an external process run by a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Literal command line that was executed.
    pub command_line: String,
    /// Exit code, or `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// The result of a single task.
///
/// Results are values: a new result replaces the old one in the
/// [`ResultCollector`](crate::results::ResultCollector), they are never
/// mutated in place.
#[derive(Debug, Clone, Default)]
pub struct TaskResult {
    kind: ResultKind,
    error: Option<Arc<TaskError>>,
    process: Option<ProcessOutput>,
}

impl TaskResult {
    pub fn not_executed() -> Self {
        Self::default()
    }

    pub fn running() -> Self {
        Self {
            kind: ResultKind::Running,
            ..Self::default()
        }
    }

    pub fn success() -> Self {
        Self {
            kind: ResultKind::Success,
            ..Self::default()
        }
    }

    pub fn failed(error: TaskError) -> Self {
        Self {
            kind: ResultKind::Failed,
            error: Some(Arc::new(error)),
            process: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            kind: ResultKind::Skipped,
            ..Self::default()
        }
    }

    /// Attach process metadata (exit code, captured output, command line).
    pub fn with_process(mut self, process: ProcessOutput) -> Self {
        self.process = Some(process);
        self
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    pub fn error(&self) -> Option<&TaskError> {
        self.error.as_deref()
    }

    /// The error cause as a shared handle, for reporting alongside the result.
    pub fn shared_error(&self) -> Option<Arc<TaskError>> {
        self.error.clone()
    }

    pub fn process(&self) -> Option<&ProcessOutput> {
        self.process.as_ref()
    }

    pub fn succeeded(&self) -> bool {
        self.kind == ResultKind::Success
    }

    pub fn failed_kind(&self) -> bool {
        self.kind == ResultKind::Failed
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}", self.kind)?;
        if let Some(err) = &self.error {
            write!(f, " {err}")?;
        }
        if let Some(code) = self.process.as_ref().and_then(|p| p.exit_code) {
            write!(f, " exit_code={code}")?;
        }
        write!(f, " ]")
    }
}

/// Result of a direct dependency, as handed to
/// [`Task::should_execute`](crate::task::Task::should_execute).
#[derive(Debug, Clone)]
pub struct ParentResult {
    pub id: TaskId,
    pub result: TaskResult,
}
