// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the `CommandExecutor` trait the scheduler consumes
//!   and the `CommandOutcome` it gets back.
//! - [`shell`] is the production executor, built on `tokio::process`.
//! - [`pool`] is the bounded worker pool that execute mode dispatches into.

pub mod backend;
pub mod pool;
pub mod shell;

pub use backend::{CommandExecutor, CommandOutcome};
pub use pool::{Job, WorkerPool};
pub use shell::ShellExecutor;
