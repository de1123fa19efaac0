#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use jobrunner::errors::TaskError;
use jobrunner::task::{ManualTaskBuilder, ParentResult, Task, TaskRegistry, TaskResult};
use jobrunner::types::TaskId;

/// One entry in an [`ExecutionLog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    Started(TaskId),
    Finished(TaskId),
}

/// Shared record of task body executions, in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    events: Arc<Mutex<Vec<LogEvent>>>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self, id: &str) {
        self.lock().push(LogEvent::Started(id.to_string()));
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self, id: &str) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.lock().push(LogEvent::Finished(id.to_string()));
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.lock().clone()
    }

    /// Ids whose body started, in start order.
    pub fn started(&self) -> Vec<TaskId> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                LogEvent::Started(id) => Some(id.clone()),
                LogEvent::Finished(_) => None,
            })
            .collect()
    }

    /// How many times each body started.
    pub fn start_counts(&self) -> HashMap<TaskId, usize> {
        let mut counts = HashMap::new();
        for id in self.started() {
            *counts.entry(id).or_insert(0) += 1;
        }
        counts
    }

    pub fn times_started(&self, id: &str) -> usize {
        self.started().iter().filter(|s| *s == id).count()
    }

    /// True if `later` started only after `earlier` finished.
    pub fn started_after_finished(&self, later: &str, earlier: &str) -> bool {
        let events = self.lock();
        let finished = events
            .iter()
            .position(|e| *e == LogEvent::Finished(earlier.to_string()));
        let started = events
            .iter()
            .position(|e| *e == LogEvent::Started(later.to_string()));
        matches!((finished, started), (Some(f), Some(s)) if f < s)
    }

    /// Largest number of bodies that were running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// What a [`FakeTask`] body does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeOutcome {
    Succeed,
    /// Returns `Ok` with a `Failed` result.
    Fail,
    /// Returns `Err(TaskError::Execution(msg))`.
    Error(String),
    Panic(String),
}

/// Configurable in-memory task that records its executions.
#[derive(Debug, Clone)]
pub struct FakeTask {
    id: TaskId,
    deps: Vec<TaskId>,
    outcome: FakeOutcome,
    delay: Duration,
    always_run: bool,
    log: ExecutionLog,
}

impl FakeTask {
    pub fn new(id: &str, log: &ExecutionLog) -> Self {
        Self {
            id: id.to_string(),
            deps: Vec::new(),
            outcome: FakeOutcome::Succeed,
            delay: Duration::ZERO,
            always_run: false,
            log: log.clone(),
        }
    }

    pub fn after(mut self, deps: &[&str]) -> Self {
        self.deps.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn outcome(mut self, outcome: FakeOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn fails(self) -> Self {
        self.outcome(FakeOutcome::Fail)
    }

    pub fn errors(self, msg: &str) -> Self {
        self.outcome(FakeOutcome::Error(msg.to_string()))
    }

    pub fn panics(self, msg: &str) -> Self {
        self.outcome(FakeOutcome::Panic(msg.to_string()))
    }

    /// Block the worker for `delay` inside the body.
    pub fn sleeps(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run regardless of dependency outcomes.
    pub fn always_run(mut self) -> Self {
        self.always_run = true;
        self
    }
}

impl Task for FakeTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[TaskId] {
        &self.deps
    }

    fn execute(&self) -> Result<TaskResult, TaskError> {
        self.log.enter(&self.id);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.log.exit(&self.id);

        match &self.outcome {
            FakeOutcome::Succeed => Ok(TaskResult::success()),
            FakeOutcome::Fail => Ok(TaskResult::failed(TaskError::NonZeroExit { code: 1 })),
            FakeOutcome::Error(msg) => Err(TaskError::Execution(msg.clone())),
            FakeOutcome::Panic(msg) => panic!("{msg}"),
        }
    }

    fn should_execute(&self, parents: &[ParentResult]) -> bool {
        self.always_run || parents.iter().all(|p| p.result.succeeded())
    }
}

/// Collects fake tasks into a registry.
#[derive(Debug, Default)]
pub struct JobBuilder {
    builder: ManualTaskBuilder,
}

impl JobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, task: impl Task + 'static) -> Self {
        self.builder = self.builder.with_task(task);
        self
    }

    /// Shorthand for a succeeding task with the given dependencies.
    pub fn ok(self, id: &str, deps: &[&str], log: &ExecutionLog) -> Self {
        self.task(FakeTask::new(id, log).after(deps))
    }

    pub fn registry(self) -> TaskRegistry {
        TaskRegistry::build(&self.builder).expect("fake job has unique ids")
    }
}
