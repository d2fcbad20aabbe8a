#![allow(dead_code)]

use dagrun::config::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use dagrun::dag::{Task, TaskGraph};
use dagrun::report::{NullReporter, SharedReporter};

/// Builder for `TaskGraph` to simplify test setup.
///
/// Tasks are inserted in call order, so a repeated id overwrites the
/// earlier one exactly as `TaskGraph::add_task` does.
pub struct TaskGraphBuilder {
    tasks: Vec<Task>,
    reporter: SharedReporter,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            reporter: NullReporter::shared(),
        }
    }

    pub fn with_reporter(mut self, reporter: SharedReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Add a task whose command equals its id.
    ///
    /// Handy with `FakeExecutor`, which only ever sees commands.
    pub fn task(self, id: &str, deps: &[&str]) -> Self {
        self.task_with_command(id, id, deps)
    }

    pub fn task_with_command(mut self, id: &str, command: &str, deps: &[&str]) -> Self {
        self.tasks
            .push(Task::new(id, command).with_dependencies(deps.iter().copied()));
        self
    }

    pub fn build(self) -> TaskGraph {
        TaskGraph::from_tasks(self.tasks, self.reporter)
    }
}

impl Default for TaskGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                task: Some(Vec::new()),
            },
        }
    }

    pub fn with_task(mut self, id: &str, command: &str, depends_on: &[&str]) -> Self {
        self.config.task.get_or_insert_with(Vec::new).push(TaskConfig {
            id: id.to_string(),
            command: command.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        });
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.config.config.jobs = Some(jobs);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
