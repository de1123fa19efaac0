// src/monitor/mod.rs

//! Periodic status logging.
//!
//! The monitor only ever reads [`ResultCollector::snapshot`]; it has no
//! influence on scheduling and may observe slightly stale state.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::results::{ResultCollector, StatusSnapshot};

pub struct Monitor;

impl Monitor {
    /// Spawn the polling task. The first snapshot is logged immediately.
    pub fn start(collector: ResultCollector, interval: Duration) -> MonitorHandle {
        let interval = interval.max(Duration::from_millis(1));
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let polled = collector.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks: u64 = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        ticks += 1;
                        log_snapshot("status", &polled.snapshot());
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            ticks
        });

        MonitorHandle {
            collector,
            stop_tx,
            task,
        }
    }
}

/// Handle to a running monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    collector: ResultCollector,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl MonitorHandle {
    /// Stop polling, then log and return one final snapshot.
    pub async fn stop(self) -> StatusSnapshot {
        let _ = self.stop_tx.send(true);
        match self.task.await {
            Ok(ticks) => info!(ticks, "monitor stopped"),
            Err(e) => warn!(error = %e, "monitor task ended abnormally"),
        }

        let last = self.collector.snapshot();
        log_snapshot("final", &last);
        last
    }
}

fn log_snapshot(label: &str, snapshot: &StatusSnapshot) {
    info!(counts = %snapshot.counts(), "{label} task status");
    for (id, kind) in snapshot.entries() {
        info!(task = %id, status = %kind, "{label}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskResult;
    use crate::types::ResultKind;

    #[tokio::test]
    async fn final_snapshot_reflects_latest_results() {
        let collector = ResultCollector::with_tasks(["A", "B"]);
        let handle = Monitor::start(collector.clone(), Duration::from_millis(5));

        collector.record_result("A", TaskResult::running());
        collector.record_result("A", TaskResult::success());
        tokio::time::sleep(Duration::from_millis(20)).await;

        let last = handle.stop().await;
        assert_eq!(last.kind_of("A"), Some(ResultKind::Success));
        assert_eq!(last.kind_of("B"), Some(ResultKind::NotExecuted));
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_every_interval() {
        let collector = ResultCollector::with_tasks(["A"]);
        let handle = Monitor::start(collector, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(35)).await;
        let _ = handle.stop_tx.send(true);
        let ticks = handle.task.await.unwrap();
        // Immediate tick plus one per elapsed interval.
        assert_eq!(ticks, 4);
    }
}
