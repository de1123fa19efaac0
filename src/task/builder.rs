// src/task/builder.rs

//! Producers of the task list for a run.
//!
//! [`FileSystemTaskBuilder`] discovers tasks from a directory: every file
//! whose extension maps to a task type becomes a task whose id is the file
//! name. Dependencies, timeout and template parameters come from an optional
//! `<task-conf>/<file stem>.toml`.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{debug, info};

use crate::config::loader::parse_task_config;
use crate::config::model::{normalize_extension, RunnerConfig, TaskFileConfig};
use crate::errors::{JobRunnerError, Result};
use crate::fs::FileSystem;
use crate::task::kinds::{TaskDefinition, TaskTypeRegistry};
use crate::task::Task;
use crate::types::parse_duration;

pub trait TaskBuilder: Send + Sync + Debug {
    fn build(&self) -> Result<Vec<Arc<dyn Task>>>;
}

/// Hands back a fixed list of tasks. Used by tests and embedders.
#[derive(Debug, Default, Clone)]
pub struct ManualTaskBuilder {
    tasks: Vec<Arc<dyn Task>>,
}

impl ManualTaskBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Arc::new(task));
        self
    }
}

impl TaskBuilder for ManualTaskBuilder {
    fn build(&self) -> Result<Vec<Arc<dyn Task>>> {
        Ok(self.tasks.clone())
    }
}

/// Discovers tasks in `tasks_dir`, configured from `conf_dir`.
#[derive(Debug)]
pub struct FileSystemTaskBuilder {
    fs: Arc<dyn FileSystem>,
    tasks_dir: PathBuf,
    conf_dir: PathBuf,
    extensions: BTreeMap<String, String>,
    template: BTreeMap<String, String>,
    types: TaskTypeRegistry,
}

impl FileSystemTaskBuilder {
    /// Both directories must exist.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        tasks_dir: impl Into<PathBuf>,
        conf_dir: impl Into<PathBuf>,
        config: &RunnerConfig,
    ) -> Result<Self> {
        let tasks_dir = tasks_dir.into();
        let conf_dir = conf_dir.into();

        for (kind, dir) in [("Task", &tasks_dir), ("Task configuration", &conf_dir)] {
            if !fs.is_dir(dir) {
                return Err(JobRunnerError::MissingDirectory {
                    kind,
                    path: dir.clone(),
                });
            }
        }

        Ok(Self {
            fs,
            tasks_dir,
            conf_dir,
            extensions: config.effective_extensions(),
            template: config.template.clone(),
            types: TaskTypeRegistry::from_config(config)?,
        })
    }

    fn task_type_for(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?;
        self.extensions
            .get(&normalize_extension(ext))
            .map(|s| s.as_str())
    }

    fn load_task_config(&self, id: &str, path: &Path) -> Result<TaskFileConfig> {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            return Ok(TaskFileConfig::default());
        };
        let conf_path = self.conf_dir.join(format!("{stem}.toml"));
        if !self.fs.is_file(&conf_path) {
            debug!(task = %id, path = %conf_path.display(), "no task config; using defaults");
            return Ok(TaskFileConfig::default());
        }

        let contents = self
            .fs
            .read_to_string(&conf_path)
            .map_err(|source| JobRunnerError::TaskSource {
                task: id.to_string(),
                source,
            })?;
        parse_task_config(&contents).map_err(|e| JobRunnerError::TaskSource {
            task: id.to_string(),
            source: anyhow!("{}: {e}", conf_path.display()),
        })
    }

    fn definition(&self, id: &str, path: &Path) -> Result<TaskDefinition> {
        let content = self
            .fs
            .read_to_string(path)
            .with_context(|| format!("reading task body for {id}"))
            .map_err(|source| JobRunnerError::TaskSource {
                task: id.to_string(),
                source,
            })?;

        let conf = self.load_task_config(id, path)?;

        let timeout = conf
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(|e| JobRunnerError::TaskSource {
                task: id.to_string(),
                source: anyhow!("timeout: {e}"),
            })?;

        let mut params = self.template.clone();
        params.extend(conf.template);

        Ok(TaskDefinition {
            id: id.to_string(),
            dependencies: conf.depends_on,
            content,
            params,
            timeout,
        })
    }
}

impl TaskBuilder for FileSystemTaskBuilder {
    fn build(&self) -> Result<Vec<Arc<dyn Task>>> {
        let mut entries = self.fs.read_dir(&self.tasks_dir)?;
        entries.sort();

        let mut tasks: Vec<Arc<dyn Task>> = Vec::with_capacity(entries.len());
        for path in entries {
            if !self.fs.is_file(&path) {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            let Some(task_type) = self.task_type_for(&path) else {
                debug!(file = %path.display(), "no task type for extension; ignoring");
                continue;
            };

            let def = self.definition(&id, &path)?;
            debug!(task = %id, %task_type, deps = ?def.dependencies, "discovered task");
            tasks.push(self.types.create(task_type, def)?);
        }

        info!(
            dir = %self.tasks_dir.display(),
            count = tasks.len(),
            "discovered tasks"
        );
        Ok(tasks)
    }
}
