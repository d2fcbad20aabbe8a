// src/exec/pool.rs

//! Fixed-size worker pool that runs dispatched tasks.
//!
//! The control loop submits a [`Job`] for every task it marks running. A
//! fixed number of Tokio workers pull jobs from one shared queue, invoke the
//! [`CommandExecutor`] outside the state lock, then re-acquire the lock to
//! record the outcome and wake the control loop.
//!
//! Shutdown is explicit: [`WorkerPool::shutdown`] closes the queue and joins
//! every worker, so no worker outlives the run that created it.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{mpsc, Mutex as AsyncMutex, Notify};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::dag::state::{FailureKind, SharedRun};
use crate::dag::task::TaskId;
use crate::errors::{DagError, Result};
use crate::report::SharedReporter;

use super::backend::{CommandExecutor, CommandOutcome};

/// A task handed to the pool.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: TaskId,
    pub command: String,
}

type JobQueue = Arc<AsyncMutex<mpsc::UnboundedReceiver<Job>>>;

pub struct WorkerPool {
    tx: Option<mpsc::UnboundedSender<Job>>,
    workers: JoinSet<()>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one).
    pub fn spawn(
        size: usize,
        run: Arc<SharedRun>,
        executor: Arc<dyn CommandExecutor>,
        reporter: SharedReporter,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let queue: JobQueue = Arc::new(AsyncMutex::new(rx));
        let mut workers = JoinSet::new();

        let size = size.max(1);
        for worker in 0..size {
            workers.spawn(worker_loop(
                worker,
                Arc::clone(&queue),
                Arc::clone(&run),
                Arc::clone(&executor),
                Arc::clone(&reporter),
            ));
        }
        debug!(workers = size, "worker pool started");

        Self {
            tx: Some(tx),
            workers,
        }
    }

    pub fn submit(&self, job: Job) -> Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| DagError::Other(anyhow!("worker pool already shut down")))?;
        tx.send(job)
            .map_err(|e| DagError::Other(anyhow!("worker queue closed; dropped task '{}'", e.0.id)))
    }

    /// Wait until a worker signals a state change.
    ///
    /// Also returns early with an error if a worker dies, since the task it
    /// was running would otherwise stay marked running forever.
    pub async fn wait_for_change(&mut self, wake: &Notify) -> Result<()> {
        tokio::select! {
            _ = wake.notified() => Ok(()),
            Some(joined) = self.workers.join_next() => match joined {
                Ok(()) => Ok(()),
                Err(e) => Err(DagError::Other(anyhow!("worker terminated abnormally: {e}"))),
            },
        }
    }

    /// Close the queue and join every worker.
    ///
    /// Jobs still queued are drained by the workers; in-flight commands run
    /// to completion.
    pub async fn shutdown(mut self) -> Result<()> {
        self.tx.take();

        let mut first_err = None;
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker terminated abnormally");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        debug!("worker pool shut down");

        match first_err {
            Some(e) => Err(DagError::Other(anyhow!("worker terminated abnormally: {e}"))),
            None => Ok(()),
        }
    }
}

async fn worker_loop(
    worker: usize,
    queue: JobQueue,
    run: Arc<SharedRun>,
    executor: Arc<dyn CommandExecutor>,
    reporter: SharedReporter,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        let halted = {
            let mut state = run.lock();
            if state.is_failed() {
                state.mark_skipped(&job.id);
                true
            } else {
                false
            }
        };
        if halted {
            debug!(worker, task = %job.id, "run halted; not starting task");
            run.wake.notify_one();
            continue;
        }

        info!(worker, task = %job.id, cmd = %job.command, "starting task");
        reporter.info(&format!("Running: [{}] -> {}", job.id, job.command));

        let outcome = executor.run(&job.command).await;

        {
            let mut state = run.lock();
            match &outcome {
                CommandOutcome::Success => state.mark_completed(&job.id),
                CommandOutcome::Failure(code) => {
                    state.mark_failed(&job.id, FailureKind::Exit(*code));
                }
                CommandOutcome::SpawnError(message) => {
                    state.mark_failed(&job.id, FailureKind::Spawn(message.clone()));
                }
            }
        }

        match &outcome {
            CommandOutcome::Success => {
                reporter.success(&format!("Success: [{}]", job.id));
            }
            CommandOutcome::Failure(code) => {
                warn!(worker, task = %job.id, exit_code = code, "task failed");
                reporter.error(&format!("Failed: [{}] (exit code: {code})", job.id));
            }
            CommandOutcome::SpawnError(message) => {
                warn!(worker, task = %job.id, error = %message, "task could not be started");
                reporter.error(&format!("Failed: [{}] ({message})", job.id));
            }
        }

        run.wake.notify_one();
    }

    debug!(worker, "worker finished (queue closed)");
}
