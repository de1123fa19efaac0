// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::types::parse_duration;

/// Command-line arguments for `jobrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jobrunner",
    version,
    about = "Run a directory of dependent tasks on a bounded worker pool.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory containing task files (one task per file).
    #[arg(long, value_name = "DIR")]
    pub tasks: PathBuf,

    /// Directory containing per-task configuration (`<task stem>.toml`).
    #[arg(long = "task-conf", value_name = "DIR")]
    pub task_conf: PathBuf,

    /// Runner configuration file (TOML).
    ///
    /// Default: `jobrunner.toml` in the task-conf directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of concurrent workers. Overrides `[runner].workers`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Status polling interval, e.g. `10s` or `500ms`.
    /// Overrides `[runner].monitor_interval`.
    #[arg(long, value_name = "DURATION", value_parser = parse_interval)]
    pub monitor_interval: Option<Duration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JOBRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Discover and validate tasks, print the plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_interval(s: &str) -> Result<Duration, String> {
    let d = parse_duration(s)?;
    if d.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(d)
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
