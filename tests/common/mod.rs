#![allow(dead_code)]

pub use jobrunner_test_utils::builders;
pub use jobrunner_test_utils::inline_pool::InlineWorkerPool;
pub use jobrunner_test_utils::{init_tracing, with_timeout};

use std::future::pending;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobrunner::engine::{JobRunner, RunOptions};
use jobrunner::results::RunReport;
use jobrunner::task::TaskRegistry;

pub fn options(workers: usize) -> RunOptions {
    RunOptions::default()
        .with_workers(workers)
        .with_monitor_interval(Duration::from_millis(50))
}

/// Run on the real blocking pool with `workers` workers.
pub async fn run_blocking(registry: TaskRegistry, workers: usize) -> RunReport {
    let runner = JobRunner::new(registry, options(workers)).expect("valid job");
    with_timeout(runner.run()).await.expect("run completes")
}

/// Run on the inline pool, returning the report and the dispatch batches.
pub async fn run_inline(registry: TaskRegistry) -> (RunReport, Vec<Vec<String>>) {
    let batches = Arc::new(Mutex::new(Vec::new()));
    let runner = JobRunner::new(registry, options(1)).expect("valid job");

    let recorded = Arc::clone(&batches);
    let report = with_timeout(
        runner.run_with_pool(move |tx| InlineWorkerPool::new(tx, recorded), pending()),
    )
    .await
    .expect("run completes");

    let batches = batches.lock().unwrap().clone();
    (report, batches)
}
