use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use jobrunner::engine::RuntimeEvent;
use jobrunner::errors::{JobRunnerError, Result};
use jobrunner::exec::{run_scheduled, CancelSignal, ScheduledTask, WorkerPool};

/// A worker pool that:
/// - records every dispatched batch (ids in dispatch order)
/// - runs each task body inline, one at a time, on the runtime's task
///
/// Only suitable for tasks that do not block for long.
pub struct InlineWorkerPool {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    batches: Arc<Mutex<Vec<Vec<String>>>>,
    closed: bool,
}

impl InlineWorkerPool {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        batches: Arc<Mutex<Vec<Vec<String>>>>,
    ) -> Self {
        Self {
            runtime_tx,
            batches,
            closed: false,
        }
    }
}

impl WorkerPool for InlineWorkerPool {
    fn dispatch(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let batches = Arc::clone(&self.batches);
        let closed = self.closed;

        Box::pin(async move {
            batches
                .lock()
                .unwrap()
                .push(tasks.iter().map(|t| t.id.clone()).collect());
            if closed {
                return Ok(());
            }

            for t in tasks {
                let mut started = false;
                let result = run_scheduled(&t, &CancelSignal::never(), || started = true);

                if started {
                    tx.send(RuntimeEvent::TaskStarted { task: t.id.clone() })
                        .await
                        .map_err(|e| JobRunnerError::Other(anyhow::Error::from(e)))?;
                }
                tx.send(RuntimeEvent::TaskFinished {
                    task: t.id.clone(),
                    result,
                })
                .await
                .map_err(|e| JobRunnerError::Other(anyhow::Error::from(e)))?;
            }
            Ok(())
        })
    }

    fn shutdown(&mut self) {
        self.closed = true;
    }

    fn capacity(&self) -> usize {
        1
    }
}
