// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawRunnerConfig, RunnerConfig, TaskFileConfig};
use crate::errors::Result;
use crate::fs::FileSystem;

/// File name looked up in the task-conf directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "jobrunner.toml";

/// Read and deserialize a runner config without semantic validation.
pub fn load_from_path(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RawRunnerConfig> {
    let path = path.as_ref();
    let contents = fs.read_to_string(path)?;
    let config: RawRunnerConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Read, deserialize and validate a runner config.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<RunnerConfig> {
    let raw = load_from_path(fs, &path)?;
    let config = RunnerConfig::try_from(raw)?;
    debug!(path = %path.as_ref().display(), ?config, "loaded runner config");
    Ok(config)
}

/// Resolve the runner config for a run.
///
/// An explicit path must exist. Otherwise `<task_conf>/jobrunner.toml` is
/// used if present, and built-in defaults if not.
pub fn resolve_runner_config(
    fs: &dyn FileSystem,
    explicit: Option<&Path>,
    task_conf: &Path,
) -> Result<RunnerConfig> {
    if let Some(path) = explicit {
        return load_and_validate(fs, path);
    }

    let fallback = default_config_path(task_conf);
    if fs.is_file(&fallback) {
        load_and_validate(fs, fallback)
    } else {
        debug!(dir = %task_conf.display(), "no runner config found; using defaults");
        Ok(RunnerConfig::default())
    }
}

pub fn default_config_path(task_conf: &Path) -> PathBuf {
    task_conf.join(DEFAULT_CONFIG_FILE)
}

/// Parse a per-task config file's contents.
pub fn parse_task_config(contents: &str) -> Result<TaskFileConfig> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::JobRunnerError;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn falls_back_to_defaults_without_a_file() {
        let fs = MockFileSystem::new();
        fs.add_dir("/conf");

        let cfg = resolve_runner_config(&fs, None, Path::new("/conf")).unwrap();
        assert!(cfg.task_type.is_empty());
    }

    #[test]
    fn picks_up_config_in_task_conf_dir() {
        let fs = MockFileSystem::new();
        fs.add_file("/conf/jobrunner.toml", "[runner]\nworkers = 3\n");

        let cfg = resolve_runner_config(&fs, None, Path::new("/conf")).unwrap();
        assert_eq!(cfg.workers(), 3);
    }

    #[test]
    fn explicit_path_must_exist() {
        let fs = MockFileSystem::new();
        let err = resolve_runner_config(&fs, Some(Path::new("/missing.toml")), Path::new("/conf"))
            .unwrap_err();
        assert!(matches!(err, JobRunnerError::Other(_)));
    }

    #[test]
    fn task_config_rejects_unknown_keys() {
        assert!(parse_task_config("depends_on = [\"a.sh\"]\n").is_ok());
        assert!(matches!(
            parse_task_config("dependson = [\"a.sh\"]\n"),
            Err(JobRunnerError::Toml(_))
        ));
    }
}
