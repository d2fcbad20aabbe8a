// src/dag/plan.rs

//! Dry-run planning.
//!
//! Simulates a run by releasing one whole ready batch at a time: every task
//! in a batch is reported, then all of them are marked done together, which
//! may make the next batch ready. Nothing is spawned.

use tracing::debug;

use crate::dag::scheduler::Scheduler;
use crate::dag::state::RunState;
use crate::dag::task::TaskId;
use crate::errors::{DagError, Result};

/// Ordered ready batches produced by [`Scheduler::plan`].
///
/// Tasks inside one batch have no ordering between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub batches: Vec<Vec<TaskId>>,
}

impl ExecutionPlan {
    /// Every planned task, batch by batch.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.batches.iter().flatten().map(|s| s.as_str())
    }

    /// Index of the batch containing `id`.
    pub fn batch_of(&self, id: &str) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.iter().any(|t| t == id))
    }

    pub fn len(&self) -> usize {
        self.batches.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

impl Scheduler<'_> {
    /// Compute and report a dependency-respecting execution order.
    ///
    /// Does not assume the graph was validated: if tasks remain but none is
    /// ready, the remaining ids are reported and a `Deadlock` error is
    /// returned.
    pub fn plan(&self) -> Result<ExecutionPlan> {
        let graph = self.graph();
        let reporter = self.reporter();

        if graph.is_empty() {
            reporter.info("No tasks to plan.");
            return Ok(ExecutionPlan::default());
        }

        reporter.plan("Starting dry run. Tasks will be listed in a possible execution order.");

        let mut state = RunState::from_graph(graph);
        let mut plan = ExecutionPlan::default();

        while !state.all_completed() {
            let mut batch = state.take_ready();
            if batch.is_empty() {
                let remaining = state.undone();
                reporter.error(
                    "Deadlock detected in dry run. The following tasks form a cycle or have missing dependencies:",
                );
                for id in &remaining {
                    reporter.error(&format!(" - Task: {id}"));
                }
                return Err(DagError::Deadlock { remaining });
            }
            batch.sort();

            for id in &batch {
                let task = graph.get_task(id)?;
                reporter.plan(&format!("Execute task '{}' (command: {})", id, task.command));
            }
            for id in &batch {
                state.mark_completed(id);
            }

            debug!(step = plan.batches.len(), ?batch, "planned batch");
            plan.batches.push(batch);
        }

        reporter.plan("Dry run finished.");
        Ok(plan)
    }
}
