// src/dag/mod.rs

//! Dependency graph representation and scheduling.
//!
//! - [`task`] defines the `Task` record.
//! - [`graph`] holds the tasks keyed by id and validates them (unknown
//!   dependencies, cycles).
//! - [`state`] is the per-run readiness bookkeeping shared by both modes.
//! - [`plan`] is the side-effect free dry run.
//! - [`scheduler`] drives execute mode over the worker pool.

pub mod graph;
pub mod plan;
pub mod scheduler;
pub mod state;
pub mod task;

pub use graph::TaskGraph;
pub use plan::ExecutionPlan;
pub use scheduler::{
    default_jobs, HaltReason, RunMode, RunReport, RunStatus, Scheduler, SchedulerOptions,
};
pub use state::{FailureKind, RunState, SharedRun, TaskFailure, TaskStatus};
pub use task::{Task, TaskId};
