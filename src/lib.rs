// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod monitor;
pub mod results;
pub mod task;
pub mod types;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::resolve_runner_config;
use crate::engine::{JobRunner, RunOptions};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::results::RunReport;
use crate::task::{FileSystemTaskBuilder, TaskRegistry};

/// High-level entry point used by `main.rs`.
///
/// Returns `None` for `--dry-run`, otherwise the report of the run. Any
/// error is a setup failure; task failures are inside the report.
pub async fn run(args: CliArgs) -> Result<Option<RunReport>> {
    let runner = prepare(&args, Arc::new(RealFileSystem))?;

    if args.dry_run {
        print_dry_run(&runner);
        return Ok(None);
    }

    let report = runner.run_until(ctrl_c()).await?;
    Ok(Some(report))
}

/// Load configuration, discover tasks and validate the graph.
///
/// Nothing is executed; every setup error surfaces here.
pub fn prepare(args: &CliArgs, fs: Arc<dyn FileSystem>) -> Result<JobRunner> {
    let cfg = resolve_runner_config(fs.as_ref(), args.config.as_deref(), &args.task_conf)?;

    let mut options = RunOptions::from_config(&cfg);
    if let Some(workers) = args.workers {
        options = options.with_workers(usize::from(workers));
    }
    if let Some(interval) = args.monitor_interval {
        options = options.with_monitor_interval(interval);
    }
    debug!(?options, "run options resolved");

    let builder = FileSystemTaskBuilder::new(fs, &args.tasks, &args.task_conf, &cfg)?;
    let registry = TaskRegistry::build(&builder)?;
    info!(tasks = registry.len(), "task registry built");

    JobRunner::new(registry, options)
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed, never
/// resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received; shutting down");
}

/// Print tasks in dependency waves without executing anything.
fn print_dry_run(runner: &JobRunner) {
    let graph = runner.graph();
    let options = runner.options();

    println!("jobrunner dry-run");
    println!("  workers = {}", options.workers);
    println!("  monitor_interval = {:?}", options.monitor_interval);
    println!();

    println!("tasks ({}):", graph.len());
    for (wave, ids) in graph.levels().iter().enumerate() {
        println!("  wave {}:", wave + 1);
        for id in ids {
            println!("    - {id}");
            let deps = graph.dependencies_of(id);
            if !deps.is_empty() {
                println!("        depends_on: {deps:?}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
