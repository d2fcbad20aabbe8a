use std::sync::{Arc, Mutex};

use dagrun::report::{Level, Reporter};

/// Reporter that keeps every line in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<(Level, String)>>,
}

impl RecordingReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|(_, m)| m.contains(needle))
    }

    /// Position of the first line containing `needle`.
    pub fn index_of(&self, needle: &str) -> Option<usize> {
        self.lines().iter().position(|(_, m)| m.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}
