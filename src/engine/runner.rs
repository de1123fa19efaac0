// src/engine/runner.rs

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::{DependencyGraph, Scheduler};
use crate::errors::Result;
use crate::exec::{BlockingWorkerPool, WorkerPool};
use crate::monitor::Monitor;
use crate::results::{ResultCollector, RunReport};
use crate::task::TaskRegistry;

use super::core::CoreRuntime;
use super::runtime::Runtime;
use super::{RunOptions, RuntimeEvent};

/// A validated job, ready to run.
///
/// Construction validates the dependency graph, so a `JobRunner` that
/// exists will always evaluate every task.
#[derive(Debug)]
pub struct JobRunner {
    registry: Arc<TaskRegistry>,
    graph: DependencyGraph,
    options: RunOptions,
}

impl JobRunner {
    pub fn new(registry: TaskRegistry, options: RunOptions) -> Result<Self> {
        let graph = DependencyGraph::build(&registry)?;
        debug!(tasks = graph.len(), roots = ?graph.roots(), "job validated");
        Ok(Self {
            registry: Arc::new(registry),
            graph,
            options,
        })
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Run every task on a [`BlockingWorkerPool`].
    pub async fn run(self) -> Result<RunReport> {
        self.run_until(std::future::pending()).await
    }

    /// Like [`JobRunner::run`], but stops early when `shutdown` resolves.
    pub async fn run_until<S>(self, shutdown: S) -> Result<RunReport>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let workers = self.options.workers;
        self.run_with_pool(move |tx| BlockingWorkerPool::new(workers, tx), shutdown)
            .await
    }

    /// Run on a pool built by `make_pool` from the runtime's event sender.
    pub async fn run_with_pool<P, F, S>(self, make_pool: F, shutdown: S) -> Result<RunReport>
    where
        P: WorkerPool,
        F: FnOnce(mpsc::Sender<RuntimeEvent>) -> P,
        S: Future<Output = ()> + Send + 'static,
    {
        // Each task yields at most two events, plus one shutdown request, so
        // senders never wait on a full channel.
        let capacity = 2 * self.registry.len() + 8;
        let (tx, rx) = mpsc::channel::<RuntimeEvent>(capacity);

        let shutdown_tx = tx.clone();
        let shutdown_watch = tokio::spawn(async move {
            shutdown.await;
            let _ = shutdown_tx.send(RuntimeEvent::ShutdownRequested).await;
        });

        let pool = make_pool(tx);
        let results = ResultCollector::with_tasks(self.registry.sorted_ids());
        let monitor = Monitor::start(results.clone(), self.options.monitor_interval);

        info!(
            tasks = self.registry.len(),
            workers = pool.capacity(),
            "starting job"
        );

        let core = CoreRuntime::new(Scheduler::new(self.graph), self.registry, results);
        let outcome = Runtime::new(core, rx, pool).run().await;

        shutdown_watch.abort();
        monitor.stop().await;

        let report = outcome?;
        info!(
            completed = report.completed,
            failed = report.task_errors.len(),
            "job finished"
        );
        Ok(report)
    }
}
