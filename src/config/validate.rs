// src/config/validate.rs

use std::collections::HashSet;

use tracing::warn;

use crate::config::model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
use crate::errors::{DagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_global_config(&raw.config)?;
        let tasks = raw.task.ok_or_else(|| {
            DagError::ConfigError(
                "the task list is missing (`[[task]]` in TOML, `tasks:` in YAML)".to_string(),
            )
        })?;
        validate_task_fields(&tasks)?;
        warn_duplicate_ids(&tasks);
        Ok(ConfigFile::new_unchecked(raw.config, tasks))
    }
}

fn validate_global_config(config: &ConfigSection) -> Result<()> {
    if config.jobs == Some(0) {
        return Err(DagError::ConfigError(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_fields(tasks: &[TaskConfig]) -> Result<()> {
    for (index, task) in tasks.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(DagError::ConfigError(format!(
                "task #{} has an empty `id`",
                index + 1
            )));
        }
        if task.command.trim().is_empty() {
            return Err(DagError::ConfigError(format!(
                "task '{}' has an empty `command`",
                task.id
            )));
        }
    }
    Ok(())
}

/// Duplicate ids are accepted; the graph keeps the last definition.
fn warn_duplicate_ids(tasks: &[TaskConfig]) {
    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            warn!(task = %task.id, "task id declared more than once; the last definition wins");
        }
    }
}
