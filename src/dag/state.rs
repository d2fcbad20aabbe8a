// src/dag/state.rs

//! Per-run bookkeeping shared by plan mode and execute mode.
//!
//! Readiness is tracked incrementally: every task carries a counter of
//! dependency edges that have not completed yet, and a task enters the ready
//! queue exactly when its counter reaches zero. Completing a task only
//! touches its direct dependents, so no round ever rescans the whole graph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::dag::graph::TaskGraph;
use crate::dag::task::TaskId;
use crate::errors::DagError;

/// Status of a task derived from set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
}

/// How a task failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The command ran and exited non-zero.
    Exit(i32),
    /// The command could not be started.
    Spawn(String),
}

/// The first task failure observed in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskId,
    pub kind: FailureKind,
}

impl From<TaskFailure> for DagError {
    fn from(failure: TaskFailure) -> Self {
        match failure.kind {
            FailureKind::Exit(exit_code) => DagError::CommandFailed {
                task: failure.task,
                exit_code,
            },
            FailureKind::Spawn(message) => DagError::SpawnFailed {
                task: failure.task,
                message,
            },
        }
    }
}

/// Mutable state for one invocation of the scheduler.
///
/// Owns its ids, so it can sit behind a lock shared with worker tasks
/// without borrowing the graph.
#[derive(Debug)]
pub struct RunState {
    /// Outstanding dependency edges per task.
    remaining: HashMap<TaskId, usize>,
    dependents: HashMap<TaskId, Vec<TaskId>>,
    ready: VecDeque<TaskId>,
    completed: HashSet<TaskId>,
    completion_order: Vec<TaskId>,
    running: HashSet<TaskId>,
    skipped: Vec<TaskId>,
    /// Sticky: once set it is never cleared or replaced.
    failure: Option<TaskFailure>,
}

impl RunState {
    pub fn from_graph(graph: &TaskGraph) -> Self {
        let dependents = graph
            .dependents_index()
            .into_iter()
            .map(|(dep, users)| {
                (
                    dep.to_string(),
                    users.into_iter().map(str::to_string).collect(),
                )
            })
            .collect();

        let mut remaining = HashMap::with_capacity(graph.len());
        let mut ready = VecDeque::new();
        for (id, task) in graph.get_all_tasks() {
            let count = task.dependencies.len();
            if count == 0 {
                ready.push_back(id.clone());
            }
            remaining.insert(id.clone(), count);
        }

        debug!(tasks = remaining.len(), roots = ready.len(), "run state initialised");

        Self {
            remaining,
            dependents,
            ready,
            completed: HashSet::new(),
            completion_order: Vec::new(),
            running: HashSet::new(),
            skipped: Vec::new(),
            failure: None,
        }
    }

    /// Drain every task that is currently ready, without marking it running.
    pub fn take_ready(&mut self) -> Vec<TaskId> {
        self.ready.drain(..).collect()
    }

    /// Drain the ready queue and mark each drained task as running.
    ///
    /// A task leaves the ready queue exactly once, so it can never be
    /// dispatched twice.
    pub fn dispatch_ready(&mut self) -> Vec<TaskId> {
        let batch = self.take_ready();
        for id in &batch {
            self.running.insert(id.clone());
        }
        batch
    }

    /// Record a successful completion and release dependents whose last
    /// outstanding dependency this was.
    pub fn mark_completed(&mut self, id: &str) {
        self.running.remove(id);
        if !self.completed.insert(id.to_string()) {
            return;
        }
        self.completion_order.push(id.to_string());

        let Some(users) = self.dependents.get(id) else {
            return;
        };
        for user in users {
            if let Some(count) = self.remaining.get_mut(user) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    trace!(task = %user, after = id, "dependencies satisfied");
                    self.ready.push_back(user.clone());
                }
            }
        }
    }

    /// Record a failed task. Only the first failure of the run is kept.
    pub fn mark_failed(&mut self, id: &str, kind: FailureKind) {
        self.running.remove(id);
        if self.failure.is_none() {
            self.failure = Some(TaskFailure {
                task: id.to_string(),
                kind,
            });
        }
    }

    /// Record a dispatched task that was never started because the run halted.
    pub fn mark_skipped(&mut self, id: &str) {
        self.running.remove(id);
        self.skipped.push(id.to_string());
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    pub fn all_completed(&self) -> bool {
        self.completed.len() == self.remaining.len()
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        if !self.remaining.contains_key(id) {
            None
        } else if self.completed.contains(id) {
            Some(TaskStatus::Done)
        } else if self.running.contains(id) {
            Some(TaskStatus::Running)
        } else {
            Some(TaskStatus::Pending)
        }
    }

    /// Tasks neither completed nor running, in id order.
    pub fn undone(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self
            .remaining
            .keys()
            .filter(|id| !self.completed.contains(*id) && !self.running.contains(*id))
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn completion_order(&self) -> &[TaskId] {
        &self.completion_order
    }

    pub fn skipped(&self) -> &[TaskId] {
        &self.skipped
    }
}

/// `RunState` behind a lock, plus the signal used to wake the control loop.
///
/// The lock is a plain `std::sync::Mutex`: it is only ever held for short,
/// non-async sections and never across an `.await`.
#[derive(Debug)]
pub struct SharedRun {
    state: Mutex<RunState>,
    pub wake: Notify,
}

impl SharedRun {
    pub fn new(state: RunState) -> Self {
        Self {
            state: Mutex::new(state),
            wake: Notify::new(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, RunState> {
        // State updates are single assignments; a panic elsewhere cannot
        // leave them half-applied.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}
