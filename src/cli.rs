// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagrun",
    version,
    about = "Run shell tasks concurrently in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task file (TOML, or YAML when ending in .yaml/.yml).
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Print a possible execution order without running any command.
    #[arg(long)]
    pub dry_run: bool,

    /// Maximum number of tasks running at once.
    ///
    /// Overrides `[config].jobs`; defaults to the number of CPUs.
    #[arg(long, short = 'j', value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub jobs: Option<u32>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Disable colored status output.
    #[arg(long)]
    pub no_color: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
