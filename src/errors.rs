// src/errors.rs

//! Crate-wide error types.
//!
//! Two channels are kept apart:
//! - [`JobRunnerError`] for setup failures (config, task discovery, graph
//!   validation). These abort a run before anything executes.
//! - [`TaskError`] for a single task's failure. These end up inside that
//!   task's [`TaskResult`](crate::task::TaskResult) and never abort the run.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum JobRunnerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{kind} directory {} does not exist", path.display())]
    MissingDirectory { kind: &'static str, path: PathBuf },

    #[error("Duplicate task id: {0}")]
    DuplicateTask(TaskId),

    #[error("{task} - a task cannot be dependent on itself")]
    SelfDependency { task: TaskId },

    #[error("{task} - there is no task with an id of: {missing}")]
    MissingDependency { task: TaskId, missing: TaskId },

    #[error("Cycle detected in task dependencies: {0}")]
    DependencyCycle(String),

    #[error(
        "Unknown task type - [{task_type}] is not a registered task type. Registered task types are {known:?}"
    )]
    UnknownTaskType {
        task_type: String,
        known: Vec<String>,
    },

    #[error("Failed to build task {task}: {source}")]
    TaskSource {
        task: TaskId,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a single task did not succeed.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{0}")]
    Execution(String),

    #[error("Environment variable: {var} is not set")]
    MissingEnv { var: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Process timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Process exited with code {code}")]
    NonZeroExit { code: i32 },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task cancelled by shutdown")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, JobRunnerError>;
