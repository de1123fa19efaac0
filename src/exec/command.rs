// src/exec/command.rs

//! External process execution for tasks that wrap a command-line tool.
//!
//! [`ExternalCommand`] is a small builder (program, args, env requirements,
//! timeout). [`ExternalCommand::run`] is *blocking*: task bodies run on
//! worker threads, so it drives a `tokio::process::Command` to completion on
//! the current runtime handle (or a throwaway current-thread runtime when
//! called outside of Tokio). [`ExternalCommand::run_cancellable`] also kills
//! the process when its [`CancelSignal`] fires.

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::TaskError;
use crate::exec::cancel::CancelSignal;
use crate::task::result::ProcessOutput;

#[derive(Debug, Clone, Default)]
pub struct ExternalCommand {
    program: String,
    args: Vec<String>,
    require_env: Vec<String>,
    timeout: Option<Duration>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Environment variables that must be set before the command may run.
    pub fn require_env<I, S>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_env.extend(vars.into_iter().map(Into::into));
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The literal command line, as recorded in [`ProcessOutput`].
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(|s| s.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fail fast if a required environment variable is absent.
    pub fn check_env(&self) -> Result<(), TaskError> {
        for var in &self.require_env {
            if std::env::var_os(var).is_none() {
                return Err(TaskError::MissingEnv { var: var.clone() });
            }
        }
        Ok(())
    }

    /// Run the command to completion, blocking the calling thread.
    ///
    /// Returns the captured output for any exit status; interpreting the
    /// exit code is left to the caller. Spawn failures, missing environment
    /// and timeouts are errors.
    pub fn run(&self) -> Result<ProcessOutput, TaskError> {
        self.run_cancellable(&CancelSignal::never())
    }

    /// Like [`ExternalCommand::run`], but kills the process and returns
    /// [`TaskError::Cancelled`] once `cancel` fires.
    pub fn run_cancellable(&self, cancel: &CancelSignal) -> Result<ProcessOutput, TaskError> {
        self.check_env()?;
        if cancel.is_cancelled() {
            return Err(TaskError::Cancelled);
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.run_async(cancel)),
            Err(_) => {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                rt.block_on(self.run_async(cancel))
            }
        }
    }

    async fn run_async(&self, cancel: &CancelSignal) -> Result<ProcessOutput, TaskError> {
        let command_line = self.command_line();
        info!(cmd = %command_line, "starting external process");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| TaskError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            res = self.wait(child, &command_line) => res?,
            _ = cancel.cancelled() => {
                warn!(cmd = %command_line, "shutdown requested; external process killed");
                return Err(TaskError::Cancelled);
            }
        };

        let exit_code = output.status.code();
        debug!(cmd = %command_line, ?exit_code, "external process exited");

        Ok(ProcessOutput {
            command_line,
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn wait(&self, child: Child, command_line: &str) -> Result<Output, TaskError> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait_with_output().await?);
        };
        match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(res) => Ok(res?),
            Err(_) => {
                warn!(cmd = %command_line, ?limit, "external process timed out; killed");
                Err(TaskError::Timeout { after: limit })
            }
        }
    }
}
