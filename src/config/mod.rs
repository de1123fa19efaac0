// src/config/mod.rs

//! Runner and per-task configuration.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: locating and reading config files.
//! - `validate.rs`: turning a raw config into a validated [`RunnerConfig`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, resolve_runner_config};
pub use model::{RawRunnerConfig, RunnerConfig, TaskFileConfig, TaskTypeConfig};
