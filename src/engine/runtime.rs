// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::{ScheduledTask, WorkerPool};
use crate::results::RunReport;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the [`CoreRuntime`] in response to `RuntimeEvent`s and delegates
/// task execution to a [`WorkerPool`].
///
/// All run semantics live in the core; this struct only moves events in and
/// tasks out.
pub struct Runtime<P: WorkerPool> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    pool: P,
}

impl<P: WorkerPool> fmt::Debug for Runtime<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("workers", &self.pool.capacity())
            .finish_non_exhaustive()
    }
}

impl<P: WorkerPool> Runtime<P> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, pool: P) -> Self {
        Self {
            core,
            event_rx,
            pool,
        }
    }

    /// Run until every task is terminal or shutdown is requested.
    pub async fn run(mut self) -> Result<RunReport> {
        info!(workers = self.pool.capacity(), "runtime started");

        let mut step = self.core.start();
        loop {
            for command in step.commands {
                self.execute_command(command).await?;
            }
            if !step.keep_running {
                break;
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };
            debug!(?event, "runtime received event");
            step = self.core.step(event);
        }

        self.pool.shutdown();
        let report = self.core.into_report();
        info!(completed = report.completed, counts = %report.counts(), "runtime exiting");
        Ok(report)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.dispatch(tasks).await,
            CoreCommand::ShutdownPool => {
                self.pool.shutdown();
                Ok(())
            }
        }
    }

    async fn dispatch(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        debug!(?ids, "dispatching ready tasks");
        self.pool.dispatch(tasks).await
    }
}
