// src/dag/scheduler.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::state::{RunState, SharedRun, TaskFailure};
use crate::dag::task::TaskId;
use crate::errors::{DagError, Result};
use crate::exec::{CommandExecutor, Job, WorkerPool};
use crate::report::SharedReporter;

/// Which of the two scheduler modes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Report a dependency-respecting order without running anything.
    Plan,
    /// Run every command, independent tasks concurrently.
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Number of workers in the execute-mode pool.
    pub jobs: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
        }
    }
}

/// Available parallelism, or 4 if the platform cannot tell.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Why an execute-mode run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    TaskFailed(TaskFailure),
    /// Work remained but nothing was ready or running.
    Deadlock(Vec<TaskId>),
    /// The run machinery itself failed (e.g. a worker died).
    Aborted(String),
}

impl From<HaltReason> for DagError {
    fn from(reason: HaltReason) -> Self {
        match reason {
            HaltReason::TaskFailed(failure) => failure.into(),
            HaltReason::Deadlock(remaining) => DagError::Deadlock { remaining },
            HaltReason::Aborted(message) => DagError::Other(anyhow::anyhow!(message)),
        }
    }
}

/// Lifecycle of one execute-mode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    Halted(HaltReason),
}

/// What a successful execute-mode run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Task ids in the order their commands finished successfully.
    pub completed: Vec<TaskId>,
}

/// Runs a validated [`TaskGraph`] in plan or execute mode.
///
/// The scheduler only borrows the graph and never mutates it. All mutable
/// state for a run lives in a [`RunState`] that is created when the run
/// starts and dropped when it ends.
///
/// Among tasks that become ready at the same time no order is guaranteed;
/// the only ordering promise is that a task never starts before every one
/// of its dependencies has completed.
pub struct Scheduler<'g> {
    graph: &'g TaskGraph,
    reporter: SharedReporter,
    options: SchedulerOptions,
    status: RunStatus,
}

impl<'g> Scheduler<'g> {
    pub fn new(graph: &'g TaskGraph, reporter: SharedReporter, options: SchedulerOptions) -> Self {
        Self {
            graph,
            reporter,
            options,
            status: RunStatus::NotStarted,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        self.graph
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// State of the most recent execute-mode run.
    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub(crate) fn reporter(&self) -> &SharedReporter {
        &self.reporter
    }

    /// Run in the given mode, discarding the mode-specific result.
    pub async fn run(&mut self, mode: RunMode, executor: Arc<dyn CommandExecutor>) -> Result<()> {
        match mode {
            RunMode::Plan => self.plan().map(|_| ()),
            RunMode::Execute => self.execute(executor).await.map(|_| ()),
        }
    }

    /// Execute every task, dispatching each one as soon as its dependencies
    /// have completed.
    ///
    /// Stops dispatching at the first failure. Tasks already handed to a
    /// worker are not cancelled: the call returns only after they finish,
    /// but their outcome no longer changes the result.
    pub async fn execute(&mut self, executor: Arc<dyn CommandExecutor>) -> Result<RunReport> {
        if self.graph.is_empty() {
            self.reporter.info("No tasks to execute.");
            self.status = RunStatus::Completed;
            return Ok(RunReport::default());
        }

        self.status = RunStatus::Running;
        info!(tasks = self.graph.len(), jobs = self.options.jobs, "starting execution");

        let run = Arc::new(SharedRun::new(RunState::from_graph(self.graph)));
        let mut pool = WorkerPool::spawn(
            self.options.jobs,
            Arc::clone(&run),
            executor,
            Arc::clone(&self.reporter),
        );

        let outcome = self.control_loop(&run, &mut pool).await;

        // No more dispatch from here on; wait for in-flight work.
        let joined = pool.shutdown().await;

        let completed = run.lock().completion_order().to_vec();

        // A dead worker outranks whatever the loop concluded.
        let halt = match outcome.and_then(|halt| joined.map(|()| halt)) {
            Ok(halt) => halt,
            Err(err) => {
                warn!(error = %err, "execution aborted");
                let reason = HaltReason::Aborted(err.to_string());
                self.report_halt(&reason);
                self.status = RunStatus::Halted(reason);
                return Err(err);
            }
        };

        match halt {
            None => {
                debug!(completed = completed.len(), "all tasks completed");
                self.status = RunStatus::Completed;
                Ok(RunReport { completed })
            }
            Some(reason) => {
                self.report_halt(&reason);
                self.status = RunStatus::Halted(reason.clone());
                Err(reason.into())
            }
        }
    }

    /// Monitor-style loop: check the predicate under the lock, dispatch
    /// whatever became ready, then sleep until a worker signals.
    ///
    /// Returns `None` once every task completed, or the reason the run
    /// halted.
    async fn control_loop(
        &self,
        run: &SharedRun,
        pool: &mut WorkerPool,
    ) -> Result<Option<HaltReason>> {
        loop {
            let batch = {
                let mut state = run.lock();

                if let Some(failure) = state.failure() {
                    return Ok(Some(HaltReason::TaskFailed(failure.clone())));
                }
                if state.all_completed() {
                    return Ok(None);
                }

                let batch = state.dispatch_ready();
                if batch.is_empty() && state.running_count() == 0 {
                    return Ok(Some(HaltReason::Deadlock(state.undone())));
                }
                batch
            };

            if !batch.is_empty() {
                debug!(?batch, "dispatching ready tasks");
            }
            for id in batch {
                let task = self.graph.get_task(&id)?;
                pool.submit(Job {
                    id,
                    command: task.command.clone(),
                })?;
            }

            pool.wait_for_change(&run.wake).await?;
        }
    }

    fn report_halt(&self, reason: &HaltReason) {
        match reason {
            HaltReason::TaskFailed(failure) => {
                self.reporter.error(&format!(
                    "Execution halted: task '{}' failed.",
                    failure.task
                ));
            }
            HaltReason::Deadlock(remaining) => {
                self.reporter
                    .error("Deadlock detected! No tasks can be started. Remaining tasks:");
                for id in remaining {
                    self.reporter.error(&format!(" - Task: {id}"));
                }
            }
            HaltReason::Aborted(message) => {
                self.reporter.error(&format!("Execution aborted: {message}"));
            }
        }
    }
}
