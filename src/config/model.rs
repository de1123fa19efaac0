// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::task::template::TemplateSyntax;
use crate::types::parse_duration;

/// File extension → task type mappings that are always available.
pub const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[("sh", "shell"), ("dummy", "dummy")];

/// Default monitor polling interval.
pub const DEFAULT_MONITOR_INTERVAL: &str = "10s";

/// Runner configuration as read from TOML (before validation).
///
/// ```toml
/// [runner]
/// workers = 4
/// monitor_interval = "10s"
///
/// [extensions]
/// hql = "hive"
///
/// [task_type.hive]
/// program = "${HIVE_HOME}/bin/hive"
/// args = ["-f", "{file}"]
/// require_env = ["HIVE_HOME"]
/// timeout = "1h"
/// file_suffix = ".hql"
/// template = "bracket"
///
/// [template]
/// schema = "dev"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRunnerConfig {
    #[serde(default)]
    pub runner: RunnerSection,

    /// Extension (without the dot) → task type name.
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,

    /// Externally executed task types, keyed by type name.
    #[serde(default)]
    pub task_type: BTreeMap<String, TaskTypeConfig>,

    /// Global template parameters; task config files override them.
    #[serde(default)]
    pub template: BTreeMap<String, String>,
}

/// Validated runner configuration.
///
/// Only constructed through `TryFrom<RawRunnerConfig>` (see
/// `config::validate`) or [`RunnerConfig::default`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub runner: RunnerSection,
    pub extensions: BTreeMap<String, String>,
    pub task_type: BTreeMap<String, TaskTypeConfig>,
    pub template: BTreeMap<String, String>,
    monitor_interval: Duration,
}

impl RunnerConfig {
    pub(crate) fn new_unchecked(raw: RawRunnerConfig, monitor_interval: Duration) -> Self {
        Self {
            runner: raw.runner,
            extensions: raw.extensions,
            task_type: raw.task_type,
            template: raw.template,
            monitor_interval,
        }
    }

    /// Worker count from `[runner].workers`, falling back to the number of
    /// available CPUs.
    pub fn workers(&self) -> usize {
        self.runner.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn monitor_interval(&self) -> Duration {
        self.monitor_interval
    }

    /// Built-in extension mappings overlaid with `[extensions]`.
    ///
    /// Keys are lowercase and carry no leading dot.
    pub fn effective_extensions(&self) -> BTreeMap<String, String> {
        let mut map: BTreeMap<String, String> = DEFAULT_EXTENSIONS
            .iter()
            .map(|(ext, ty)| (ext.to_string(), ty.to_string()))
            .collect();
        for (ext, ty) in self.extensions.iter() {
            map.insert(normalize_extension(ext), ty.clone());
        }
        map
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let interval = parse_duration(DEFAULT_MONITOR_INTERVAL).unwrap_or(Duration::from_secs(10));
        Self::new_unchecked(RawRunnerConfig::default(), interval)
    }
}

pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

/// `[runner]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    /// Size of the worker pool. Defaults to the number of CPUs.
    #[serde(default)]
    pub workers: Option<usize>,

    /// How often the monitor logs task status, e.g. `"10s"`.
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval: String,
}

fn default_monitor_interval() -> String {
    DEFAULT_MONITOR_INTERVAL.to_string()
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            workers: None,
            monitor_interval: default_monitor_interval(),
        }
    }
}

/// `[task_type.<name>]` section: a task type backed by an external program.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskTypeConfig {
    /// Program to run; `${VAR}` references are expanded from the environment.
    pub program: String,

    /// Arguments; `"{file}"` is replaced with the rendered task body's path.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Environment variables that must be present before running.
    #[serde(default)]
    pub require_env: Vec<String>,

    /// Wall-clock limit for the process, e.g. `"30m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Suffix used for the rendered body's temp file.
    #[serde(default)]
    pub file_suffix: Option<String>,

    /// How bodies of this type are templated: `"bracket"` (default) or
    /// `"plain"`.
    #[serde(default)]
    pub template: TemplateSyntax,
}

fn default_args() -> Vec<String> {
    vec![crate::task::kinds::FILE_PLACEHOLDER.to_string()]
}

/// Per-task configuration file (`<task-conf>/<task stem>.toml`).
///
/// ```toml
/// depends_on = ["01_drop_table.sh"]
/// timeout = "5m"
///
/// [template]
/// table = "people"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TaskFileConfig {
    /// Ids of tasks that must finish successfully before this one runs.
    #[serde(default, alias = "depends-on")]
    pub depends_on: Vec<String>,

    /// Per-task override of the task type's timeout.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Template parameters, overriding the runner's `[template]` table.
    #[serde(default)]
    pub template: BTreeMap<String, String>,
}
