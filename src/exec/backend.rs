// src/exec/backend.rs

//! Pluggable command executor abstraction.
//!
//! The scheduler talks to a `CommandExecutor` instead of spawning processes
//! itself. Production code uses [`ShellExecutor`](super::ShellExecutor);
//! tests swap in a fake that scripts outcomes and records what ran.

use std::future::Future;
use std::pin::Pin;

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit, or `-1` when the process was terminated by a signal.
    Failure(i32),
    /// The process could not be started at all.
    SpawnError(String),
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}

/// Trait abstracting how a task's command is run.
///
/// From the caller's point of view a run is a single awaited call: it
/// resolves once the command has finished, never earlier.
pub trait CommandExecutor: Send + Sync {
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = CommandOutcome> + Send + 'a>>;
}
