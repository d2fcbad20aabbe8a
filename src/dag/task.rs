// src/dag/task.rs

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// A unit of work: a shell command plus the ids it must wait for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub command: String,
    /// Direct dependencies, in declaration order.
    pub dependencies: Vec<TaskId>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }
}
