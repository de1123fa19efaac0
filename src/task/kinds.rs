// src/task/kinds.rs

//! Task types and the type-name → constructor registry.
//!
//! Every concrete task is a [`FileTask`]: an id, dependencies and a body,
//! composed with a [`TemplateRenderer`] and an [`ExecutionStrategy`]. Both
//! are chosen by the task's type name through [`TaskTypeRegistry`], which is
//! populated from built-ins plus `[task_type.<name>]` config tables.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::{Captures, Regex};
use tracing::{debug, error, trace};

use crate::config::model::{RunnerConfig, TaskTypeConfig};
use crate::errors::{JobRunnerError, Result, TaskError};
use crate::exec::cancel::CancelSignal;
use crate::exec::command::ExternalCommand;
use crate::task::template::{BracketRenderer, TemplateRenderer, TemplateSyntax};
use crate::task::{Task, TaskResult};
use crate::types::{parse_duration, TaskId};

/// Placeholder in `args` replaced by the path of the rendered task body.
pub const FILE_PLACEHOLDER: &str = "{file}";

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env reference regex is valid")
});

/// How a type of task is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// No body; always succeeds.
    Dummy,
    /// Body is a shell script run with `sh`.
    Shell,
    /// Body is handed to an arbitrary external program.
    External(ExternalSpec),
}

impl TaskKind {
    fn strategy(&self) -> ExecutionStrategy {
        match self {
            TaskKind::Dummy => ExecutionStrategy::Noop,
            TaskKind::Shell => ExecutionStrategy::Command(ExternalSpec::shell()),
            TaskKind::External(spec) => ExecutionStrategy::Command(spec.clone()),
        }
    }

    fn template(&self) -> TemplateSyntax {
        match self {
            TaskKind::Dummy | TaskKind::Shell => TemplateSyntax::Bracket,
            TaskKind::External(spec) => spec.template,
        }
    }
}

/// Description of an external program that executes a rendered task body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSpec {
    /// Program to run. `${VAR}` references are expanded from the environment.
    pub program: String,
    /// Arguments; `{file}` is replaced by the rendered body's temp file.
    pub args: Vec<String>,
    /// Environment variables that must be set, checked before anything runs.
    pub require_env: Vec<String>,
    pub timeout: Option<Duration>,
    /// Suffix for the temp file holding the rendered body (e.g. `".hql"`).
    pub file_suffix: String,
    pub template: TemplateSyntax,
}

impl ExternalSpec {
    pub fn shell() -> Self {
        Self {
            program: "sh".to_string(),
            args: vec![FILE_PLACEHOLDER.to_string()],
            require_env: Vec::new(),
            timeout: None,
            file_suffix: ".sh".to_string(),
            template: TemplateSyntax::Bracket,
        }
    }

    fn from_config(name: &str, cfg: &TaskTypeConfig) -> Result<Self> {
        let timeout = cfg
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .map_err(|e| {
                JobRunnerError::Config(format!("[task_type.{name}].timeout: {e}"))
            })?;

        Ok(Self {
            program: cfg.program.clone(),
            args: cfg.args.clone(),
            require_env: cfg.require_env.clone(),
            timeout,
            file_suffix: cfg.file_suffix.clone().unwrap_or_default(),
            template: cfg.template,
        })
    }
}

/// What `execute()` actually does for a [`FileTask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Noop,
    Command(ExternalSpec),
}

/// Everything a builder knows about a task before its type is applied.
#[derive(Debug, Clone, Default)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub dependencies: Vec<TaskId>,
    pub content: String,
    pub params: BTreeMap<String, String>,
    /// Per-task override of the type's timeout.
    pub timeout: Option<Duration>,
}

/// The concrete task used for every configured task type.
#[derive(Debug)]
pub struct FileTask {
    def: TaskDefinition,
    renderer: Arc<dyn TemplateRenderer>,
    strategy: ExecutionStrategy,
}

impl FileTask {
    pub fn new(
        def: TaskDefinition,
        renderer: Arc<dyn TemplateRenderer>,
        strategy: ExecutionStrategy,
    ) -> Self {
        trace!(task = %def.id, ?strategy, "built task");
        Self {
            def,
            renderer,
            strategy,
        }
    }

    /// A task with no body that always succeeds.
    pub fn dummy(id: &str, deps: &[&str]) -> Self {
        Self::new(
            TaskDefinition {
                id: id.to_string(),
                dependencies: deps.iter().map(|d| d.to_string()).collect(),
                ..TaskDefinition::default()
            },
            Arc::new(BracketRenderer),
            ExecutionStrategy::Noop,
        )
    }

    /// The body after templating.
    pub fn rendered_content(&self) -> std::result::Result<String, TaskError> {
        self.renderer
            .render(&self.def.id, &self.def.content, &self.def.params)
    }

    fn run_command(
        &self,
        spec: &ExternalSpec,
        cancel: &CancelSignal,
    ) -> std::result::Result<TaskResult, TaskError> {
        let base = ExternalCommand::new(spec.program.clone()).require_env(spec.require_env.clone());
        base.check_env()?;

        let program = expand_env(&spec.program)?;
        let rendered = self.rendered_content()?;

        let mut body = tempfile::Builder::new()
            .prefix("jobrunner")
            .suffix(&spec.file_suffix)
            .tempfile()?;
        writeln!(body, "{rendered}")?;
        body.flush()?;

        let file = body.path().display().to_string();
        let args = spec
            .args
            .iter()
            .map(|a| a.replace(FILE_PLACEHOLDER, &file));

        let output = ExternalCommand::new(program)
            .with_args(args)
            .with_timeout(self.def.timeout.or(spec.timeout))
            .run_cancellable(cancel)?;

        match output.exit_code {
            Some(0) => Ok(TaskResult::success().with_process(output)),
            code => {
                let code = code.unwrap_or(-1);
                error!(task = %self.def.id, exit_code = code, stderr = %output.stderr.trim(), "task process failed");
                Ok(TaskResult::failed(TaskError::NonZeroExit { code }).with_process(output))
            }
        }
    }
}

impl Task for FileTask {
    fn id(&self) -> &str {
        &self.def.id
    }

    fn dependencies(&self) -> &[TaskId] {
        &self.def.dependencies
    }

    fn execute(&self) -> std::result::Result<TaskResult, TaskError> {
        self.execute_cancellable(&CancelSignal::never())
    }

    fn execute_cancellable(
        &self,
        cancel: &CancelSignal,
    ) -> std::result::Result<TaskResult, TaskError> {
        match &self.strategy {
            ExecutionStrategy::Noop => {
                trace!(task = %self.def.id, "noop task executed");
                Ok(TaskResult::success())
            }
            ExecutionStrategy::Command(spec) => self.run_command(spec, cancel),
        }
    }
}

/// Expand `${VAR}` references from the environment.
fn expand_env(s: &str) -> std::result::Result<String, TaskError> {
    let mut missing: Option<String> = None;
    let expanded = ENV_REFERENCE.replace_all(s, |caps: &Captures| match std::env::var(&caps[1]) {
        Ok(v) => v,
        Err(_) => {
            missing.get_or_insert_with(|| caps[1].to_string());
            String::new()
        }
    });

    match missing {
        Some(var) => Err(TaskError::MissingEnv { var }),
        None => Ok(expanded.into_owned()),
    }
}

/// Maps task-type names to [`TaskKind`]s.
#[derive(Debug, Clone)]
pub struct TaskTypeRegistry {
    kinds: BTreeMap<String, TaskKind>,
}

impl Default for TaskTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTypeRegistry {
    /// Registry with the built-in `dummy` and `shell` types.
    pub fn new() -> Self {
        let mut kinds = BTreeMap::new();
        kinds.insert("dummy".to_string(), TaskKind::Dummy);
        kinds.insert("shell".to_string(), TaskKind::Shell);
        Self { kinds }
    }

    /// Built-ins plus every `[task_type.<name>]` table in the config.
    pub fn from_config(cfg: &RunnerConfig) -> Result<Self> {
        let mut registry = Self::new();
        for (name, tc) in cfg.task_type.iter() {
            let spec = ExternalSpec::from_config(name, tc)?;
            registry.register(name, TaskKind::External(spec));
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: &str, kind: TaskKind) {
        debug!(task_type = %name, ?kind, "registered task type");
        self.kinds.insert(name.to_string(), kind);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.kinds.keys().cloned().collect()
    }

    /// Construct a task of type `task_type`.
    pub fn create(&self, task_type: &str, def: TaskDefinition) -> Result<Arc<dyn Task>> {
        let kind = self
            .kinds
            .get(task_type)
            .ok_or_else(|| JobRunnerError::UnknownTaskType {
                task_type: task_type.to_string(),
                known: self.names(),
            })?;

        Ok(Arc::new(FileTask::new(
            def,
            kind.template().renderer(),
            kind.strategy(),
        )))
    }
}
