// src/config/model.rs

use serde::Deserialize;

use crate::dag::Task;

/// Configuration as read from disk, before validation.
///
/// TOML form:
///
/// ```toml
/// [config]
/// jobs = 4
///
/// [[task]]
/// id = "build"
/// command = "cargo build"
/// depends_on = ["fetch"]
/// ```
///
/// The YAML form uses a top-level `tasks:` sequence with the same fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Task records in declaration order. Required: a file without a task
    /// list is rejected rather than treated as an empty run.
    #[serde(alias = "tasks")]
    pub task: Option<Vec<TaskConfig>>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, task: Vec<TaskConfig>) -> Self {
        Self { config, task }
    }

    /// Convert the task records into graph tasks, keeping declaration order.
    pub fn tasks(&self) -> Vec<Task> {
        self.task.iter().map(TaskConfig::to_task).collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Worker pool size for execute mode. `--jobs` takes precedence.
    #[serde(default)]
    pub jobs: Option<usize>,
}

/// One `[[task]]` record.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub id: String,

    /// Shell command to run.
    pub command: String,

    /// Ids of tasks that must complete first.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl TaskConfig {
    pub fn to_task(&self) -> Task {
        Task::new(self.id.clone(), self.command.clone())
            .with_dependencies(self.depends_on.iter().cloned())
    }
}
