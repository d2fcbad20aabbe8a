// src/exec/shell.rs

//! Real process execution through the platform shell.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, error};

use super::backend::{CommandExecutor, CommandOutcome};

/// Runs commands with `sh -c` (or `cmd /C` on Windows).
///
/// Stdout and stderr are inherited so task output reaches the terminal
/// directly; logs go to stderr through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    fn build(command: &str) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    async fn run_inner(command: &str) -> Result<CommandOutcome> {
        let mut child = Self::build(command)
            .spawn()
            .with_context(|| format!("spawning shell for `{command}`"))?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for `{command}`"))?;

        let code = status.code().unwrap_or(-1);
        debug!(cmd = %command, exit_code = code, success = status.success(), "process exited");

        Ok(if status.success() {
            CommandOutcome::Success
        } else {
            CommandOutcome::Failure(code)
        })
    }
}

impl CommandExecutor for ShellExecutor {
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = CommandOutcome> + Send + 'a>> {
        Box::pin(async move {
            match Self::run_inner(command).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(cmd = %command, error = %err, "command execution error");
                    CommandOutcome::SpawnError(format!("{err:#}"))
                }
            }
        })
    }
}
