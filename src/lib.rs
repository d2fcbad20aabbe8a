// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;

use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::dag::{default_jobs, RunMode, Scheduler, SchedulerOptions, TaskGraph};
use crate::errors::{DagError, Result};
use crate::exec::{CommandExecutor, ShellExecutor};
use crate::report::{ConsoleReporter, SharedReporter};

/// High-level entry point used by `main.rs`.
///
/// Wires the console reporter and the shell executor into [`run_with`].
pub async fn run(args: CliArgs) -> Result<()> {
    let reporter = ConsoleReporter::shared(!args.no_color);
    run_with(args, reporter, Arc::new(ShellExecutor::new())).await
}

/// Run the whole pipeline with injected collaborators:
///
/// config source -> task list -> graph -> validate -> scheduler (plan or execute).
///
/// Any error is reported as a fatal line before being returned.
pub async fn run_with(
    args: CliArgs,
    reporter: SharedReporter,
    executor: Arc<dyn CommandExecutor>,
) -> Result<()> {
    let result = run_pipeline(&args, &reporter, executor).await;
    if let Err(err) = &result {
        reporter.error(&format!("Fatal error: {err}"));
    }
    result
}

async fn run_pipeline(
    args: &CliArgs,
    reporter: &SharedReporter,
    executor: Arc<dyn CommandExecutor>,
) -> Result<()> {
    let config_path = args.config.as_ref().ok_or(DagError::ConfigMissing)?;

    if args.dry_run {
        reporter.info("Running in dry-run mode.");
    }
    reporter.info(&format!("Target config: {}", config_path.display()));
    reporter.info("Parsing configuration file...");
    let cfg = load_and_validate(config_path)?;

    reporter.info("Building dependency graph...");
    let graph = TaskGraph::from_tasks(cfg.tasks(), Arc::clone(reporter));

    reporter.info("Validating dependency graph...");
    graph.validate()?;

    let options = SchedulerOptions {
        jobs: resolve_jobs(args.jobs, cfg.config.jobs),
    };
    info!(tasks = graph.len(), jobs = options.jobs, dry_run = args.dry_run, "scheduler configured");

    let mode = if args.dry_run {
        RunMode::Plan
    } else {
        RunMode::Execute
    };

    let mut scheduler = Scheduler::new(&graph, Arc::clone(reporter), options);
    scheduler.run(mode, executor).await?;

    if mode == RunMode::Execute {
        reporter.success("All tasks completed successfully.");
    }
    debug!(?mode, "run finished");
    Ok(())
}

/// `--jobs` wins over `[config].jobs`, which wins over the CPU count.
pub fn resolve_jobs(cli: Option<u32>, config: Option<usize>) -> usize {
    cli.map(|n| n as usize)
        .or(config)
        .unwrap_or_else(default_jobs)
        .max(1)
}
