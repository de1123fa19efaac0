// src/dag/mod.rs

//! Dependency graph and scheduling.
//!
//! - [`graph`] validates the registry and holds deps/dependents per task.
//! - [`state`] is the per-task state machine.
//! - [`scheduler`] decides which tasks are ready and claims them.
//! - [`scheduler_step`] is the result type of one scheduler step.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state;

pub use graph::DependencyGraph;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use state::TaskState;
