use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use dagrun::exec::{CommandExecutor, CommandOutcome};

/// Something the fake executor observed, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String, CommandOutcome),
}

#[derive(Debug, Clone)]
struct Script {
    delay: Duration,
    outcome: CommandOutcome,
    panics: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: CommandOutcome::Success,
            panics: false,
        }
    }
}

/// A fake executor that:
/// - records when each command starts and finishes
/// - sleeps for a scripted delay instead of spawning a process
/// - returns a scripted outcome (success unless told otherwise)
/// - tracks the highest number of commands in flight at once.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    scripts: HashMap<String, Script>,
    events: Mutex<Vec<ExecEvent>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, command: &str, millis: u64) -> Self {
        self.scripts.entry(command.to_string()).or_default().delay =
            Duration::from_millis(millis);
        self
    }

    pub fn with_failure(mut self, command: &str, exit_code: i32) -> Self {
        self.scripts.entry(command.to_string()).or_default().outcome =
            CommandOutcome::Failure(exit_code);
        self
    }

    pub fn with_spawn_error(mut self, command: &str, message: &str) -> Self {
        self.scripts.entry(command.to_string()).or_default().outcome =
            CommandOutcome::SpawnError(message.to_string());
        self
    }

    /// Panic after the scripted delay instead of returning, killing the worker.
    pub fn with_panic(mut self, command: &str) -> Self {
        self.scripts.entry(command.to_string()).or_default().panics = true;
        self
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Commands in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started(c) => Some(c),
                ExecEvent::Finished(..) => None,
            })
            .collect()
    }

    /// Commands in the order they finished.
    pub fn finished(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Finished(c, _) => Some(c),
                ExecEvent::Started(_) => None,
            })
            .collect()
    }

    pub fn was_started(&self, command: &str) -> bool {
        self.started().iter().any(|c| c == command)
    }

    pub fn start_index(&self, command: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| matches!(e, ExecEvent::Started(c) if c == command))
    }

    pub fn finish_index(&self, command: &str) -> Option<usize> {
        self.events()
            .iter()
            .position(|e| matches!(e, ExecEvent::Finished(c, _) if c == command))
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, event: ExecEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl CommandExecutor for FakeExecutor {
    fn run<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = CommandOutcome> + Send + 'a>> {
        Box::pin(async move {
            let script = self.scripts.get(command).cloned().unwrap_or_default();

            self.record(ExecEvent::Started(command.to_string()));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !script.delay.is_zero() {
                tokio::time::sleep(script.delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if script.panics {
                panic!("scripted panic in `{command}`");
            }
            self.record(ExecEvent::Finished(command.to_string(), script.outcome.clone()));
            script.outcome
        })
    }
}
