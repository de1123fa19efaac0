// src/config/validate.rs

use std::collections::BTreeSet;

use crate::config::model::{RawRunnerConfig, RunnerConfig, DEFAULT_EXTENSIONS};
use crate::errors::{JobRunnerError, Result};
use crate::types::parse_duration;

const BUILTIN_TYPES: &[&str] = &["dummy", "shell"];

impl TryFrom<RawRunnerConfig> for RunnerConfig {
    type Error = crate::errors::JobRunnerError;

    fn try_from(raw: RawRunnerConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let interval = parse_duration(&raw.runner.monitor_interval).map_err(|e| {
            JobRunnerError::Config(format!("[runner].monitor_interval: {e}"))
        })?;
        Ok(RunnerConfig::new_unchecked(raw, interval))
    }
}

fn validate_raw_config(cfg: &RawRunnerConfig) -> Result<()> {
    validate_runner_section(cfg)?;
    validate_task_types(cfg)?;
    validate_extensions(cfg)?;
    Ok(())
}

fn validate_runner_section(cfg: &RawRunnerConfig) -> Result<()> {
    if cfg.runner.workers == Some(0) {
        return Err(JobRunnerError::Config(
            "[runner].workers must be >= 1 (got 0)".to_string(),
        ));
    }

    match parse_duration(&cfg.runner.monitor_interval) {
        Ok(d) if d.is_zero() => Err(JobRunnerError::Config(
            "[runner].monitor_interval must be greater than zero".to_string(),
        )),
        Ok(_) => Ok(()),
        Err(e) => Err(JobRunnerError::Config(format!(
            "[runner].monitor_interval: {e}"
        ))),
    }
}

fn validate_task_types(cfg: &RawRunnerConfig) -> Result<()> {
    for (name, tt) in cfg.task_type.iter() {
        if BUILTIN_TYPES.contains(&name.as_str()) {
            return Err(JobRunnerError::Config(format!(
                "[task_type.{name}] redefines a built-in task type"
            )));
        }
        if tt.program.trim().is_empty() {
            return Err(JobRunnerError::Config(format!(
                "[task_type.{name}].program must not be empty"
            )));
        }
        if let Some(ref t) = tt.timeout {
            parse_duration(t).map_err(|e| {
                JobRunnerError::Config(format!("[task_type.{name}].timeout: {e}"))
            })?;
        }
    }
    Ok(())
}

fn validate_extensions(cfg: &RawRunnerConfig) -> Result<()> {
    let known: BTreeSet<&str> = BUILTIN_TYPES
        .iter()
        .copied()
        .chain(cfg.task_type.keys().map(|k| k.as_str()))
        .collect();

    for (ext, ty) in cfg.extensions.iter() {
        if ext.trim().trim_start_matches('.').is_empty() {
            return Err(JobRunnerError::Config(
                "[extensions] contains an empty extension".to_string(),
            ));
        }
        if !known.contains(ty.as_str()) {
            return Err(JobRunnerError::Config(format!(
                "extension '{ext}' maps to unknown task type '{ty}' (known: {known:?})"
            )));
        }
    }

    debug_assert!(DEFAULT_EXTENSIONS
        .iter()
        .all(|(_, ty)| BUILTIN_TYPES.contains(ty)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::TaskTypeConfig;
    use crate::task::template::TemplateSyntax;

    fn raw(toml_src: &str) -> RawRunnerConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = RunnerConfig::try_from(raw("")).unwrap();
        assert_eq!(cfg.monitor_interval(), std::time::Duration::from_secs(10));
        assert_eq!(cfg.effective_extensions().get("sh").map(|s| s.as_str()), Some("shell"));
        assert!(cfg.workers() >= 1);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = RunnerConfig::try_from(raw("[runner]\nworkers = 0\n")).unwrap_err();
        assert!(matches!(err, JobRunnerError::Config(msg) if msg.contains("workers")));
    }

    #[test]
    fn bad_monitor_interval_is_rejected() {
        let err =
            RunnerConfig::try_from(raw("[runner]\nmonitor_interval = \"often\"\n")).unwrap_err();
        assert!(matches!(err, JobRunnerError::Config(msg) if msg.contains("monitor_interval")));
    }

    #[test]
    fn extension_must_map_to_known_type() {
        let err = RunnerConfig::try_from(raw("[extensions]\nsql = \"jdbc\"\n")).unwrap_err();
        assert!(matches!(err, JobRunnerError::Config(msg) if msg.contains("jdbc")));
    }

    #[test]
    fn configured_task_type_is_accepted() {
        let cfg = RunnerConfig::try_from(raw(
            r#"
[extensions]
".HQL" = "hive"

[task_type.hive]
program = "${HIVE_HOME}/bin/hive"
args = ["-f", "{file}"]
require_env = ["HIVE_HOME"]
timeout = "1h"
"#,
        ))
        .unwrap();

        assert_eq!(cfg.effective_extensions().get("hql").map(|s| s.as_str()), Some("hive"));
        let tt: &TaskTypeConfig = &cfg.task_type["hive"];
        assert_eq!(tt.args, vec!["-f".to_string(), "{file}".to_string()]);
    }

    #[test]
    fn task_type_template_syntax_is_parsed() {
        let cfg = RunnerConfig::try_from(raw(
            "[task_type.raw]\nprogram = \"sh\"\ntemplate = \"plain\"\n",
        ))
        .unwrap();
        assert_eq!(cfg.task_type["raw"].template, TemplateSyntax::Plain);

        let unknown: std::result::Result<RawRunnerConfig, _> =
            toml::from_str("[task_type.raw]\nprogram = \"sh\"\ntemplate = \"jinja\"\n");
        assert!(unknown.is_err());
    }

    #[test]
    fn builtin_types_cannot_be_redefined() {
        let err =
            RunnerConfig::try_from(raw("[task_type.shell]\nprogram = \"bash\"\n")).unwrap_err();
        assert!(matches!(err, JobRunnerError::Config(msg) if msg.contains("built-in")));
    }
}
