// src/exec/backend.rs

//! Pluggable worker pool abstraction.
//!
//! The runtime hands claimed tasks to a [`WorkerPool`] and learns about
//! their progress only through [`RuntimeEvent`]s on its channel. Production
//! uses [`BlockingWorkerPool`]; tests can supply a pool that runs tasks
//! inline or records what was dispatched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info};

use crate::engine::RuntimeEvent;
use crate::errors::{Result, TaskError};
use crate::exec::cancel::CancelSource;
use crate::exec::worker::{run_scheduled, ScheduledTask};
use crate::task::TaskResult;

/// How claimed tasks get executed.
///
/// Implementations must eventually send exactly one
/// `RuntimeEvent::TaskFinished` per dispatched task (unless shut down), and
/// a `TaskStarted` before it whenever the body actually runs.
pub trait WorkerPool: Send {
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Stop accepting work and cancel running bodies. Tasks that have not
    /// started yet never will.
    fn shutdown(&mut self) {}

    /// Maximum number of bodies running at once.
    fn capacity(&self) -> usize;
}

/// Bounded pool of blocking workers.
///
/// Each dispatched task waits for one of `workers` semaphore permits, then
/// runs on Tokio's blocking thread pool while holding it. Shutting down
/// closes the semaphore and fires the pool's cancel signal, which kills
/// running external processes.
#[derive(Debug)]
pub struct BlockingWorkerPool {
    permits: Arc<Semaphore>,
    workers: usize,
    event_tx: mpsc::Sender<RuntimeEvent>,
    cancel: CancelSource,
}

impl BlockingWorkerPool {
    /// `workers` is clamped to at least 1.
    pub fn new(workers: usize, event_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        let workers = workers.max(1);
        info!(workers, "worker pool created");
        Self {
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            event_tx,
            cancel: CancelSource::new(),
        }
    }

    fn spawn_one(&self, scheduled: ScheduledTask) {
        let permits = Arc::clone(&self.permits);
        let tx = self.event_tx.clone();
        let cancel = self.cancel.signal();

        tokio::spawn(async move {
            let id = scheduled.id.clone();
            let Ok(permit) = permits.acquire_owned().await else {
                debug!(task = %id, "worker pool closed; task not started");
                return;
            };

            let start_tx = tx.clone();
            let start_id = id.clone();
            let joined = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                run_scheduled(&scheduled, &cancel, || {
                    let _ = start_tx.blocking_send(RuntimeEvent::TaskStarted { task: start_id });
                })
            })
            .await;

            let result = joined.unwrap_or_else(|e| {
                error!(task = %id, error = %e, "worker thread did not complete");
                TaskResult::failed(TaskError::Panicked(e.to_string()))
            });

            if tx
                .send(RuntimeEvent::TaskFinished { task: id.clone(), result })
                .await
                .is_err()
            {
                debug!(task = %id, "runtime gone; dropping task result");
            }
        });
    }
}

impl WorkerPool for BlockingWorkerPool {
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        for scheduled in tasks {
            debug!(task = %scheduled.id, "dispatching to worker pool");
            self.spawn_one(scheduled);
        }
        Box::pin(async { Ok(()) })
    }

    fn shutdown(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        info!("worker pool shutting down; cancelling running tasks");
        self.permits.close();
        self.cancel.cancel();
    }

    fn capacity(&self) -> usize {
        self.workers
    }
}
