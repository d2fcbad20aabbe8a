// src/report.rs

//! User-facing status lines.
//!
//! The graph and the scheduler never print directly; they are handed a
//! [`Reporter`] at construction time and push leveled messages into it.
//! Nothing they receive back is consulted for decisions.
//!
//! Diagnostics that only matter when debugging go through `tracing`
//! instead (see [`crate::logging`]).

use std::io::Write;
use std::sync::{Arc, Mutex};

use colored::Colorize;

/// Level of a reported status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    Plan,
}

impl Level {
    pub fn tag(self) -> &'static str {
        match self {
            Level::Info => "[INFO]   ",
            Level::Success => "[SUCCESS]",
            Level::Warn => "[WARN]   ",
            Level::Error => "[ERROR]  ",
            Level::Plan => "[PLAN]   ",
        }
    }
}

/// Sink for leveled status lines.
pub trait Reporter: Send + Sync {
    fn report(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    fn success(&self, message: &str) {
        self.report(Level::Success, message);
    }

    fn warn(&self, message: &str) {
        self.report(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }

    fn plan(&self, message: &str) {
        self.report(Level::Plan, message);
    }
}

/// Shared handle passed into the graph and the scheduler.
pub type SharedReporter = Arc<dyn Reporter>;

/// Writes tagged lines to the terminal.
///
/// `Error` goes to stderr, everything else to stdout. A single mutex
/// serialises writes so lines from concurrent workers never interleave.
#[derive(Debug)]
pub struct ConsoleReporter {
    color: bool,
    lock: Mutex<()>,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            lock: Mutex::new(()),
        }
    }

    pub fn shared(color: bool) -> SharedReporter {
        Arc::new(Self::new(color))
    }

    fn render(&self, level: Level, message: &str) -> String {
        let line = format!("{} {}", level.tag(), message);
        if !self.color {
            return line;
        }
        match level {
            Level::Info => line,
            Level::Success => line.green().to_string(),
            Level::Warn => line.yellow().to_string(),
            Level::Error => line.red().to_string(),
            Level::Plan => line.cyan().to_string(),
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, level: Level, message: &str) {
        let line = self.render(level, message);
        // A poisoned lock only means another writer panicked mid-line.
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        // Terminal write failures (closed pipe etc.) are not worth aborting a run for.
        if level == Level::Error {
            let _ = writeln!(std::io::stderr().lock(), "{line}");
        } else {
            let _ = writeln!(std::io::stdout().lock(), "{line}");
        }
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl NullReporter {
    pub fn shared() -> SharedReporter {
        Arc::new(NullReporter)
    }
}

impl Reporter for NullReporter {
    fn report(&self, _level: Level, _message: &str) {}
}
