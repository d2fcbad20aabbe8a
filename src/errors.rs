// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagError {
    #[error("Configuration file path is missing. Usage: dagrun <CONFIG> [--dry-run]")]
    ConfigMissing,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Task '{task}' has an unknown dependency '{dependency}'")]
    UnknownDependency { task: String, dependency: String },

    #[error("Cycle detected in dependency graph involving task '{0}'")]
    CycleDetected(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task '{task}' failed with exit code {exit_code}")]
    CommandFailed { task: String, exit_code: i32 },

    #[error("Task '{task}' could not be started: {message}")]
    SpawnFailed { task: String, message: String },

    #[error("Deadlock detected; tasks that can never run: {}", remaining.join(", "))]
    Deadlock { remaining: Vec<String> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagError {
    /// Errors raised by `TaskGraph::validate`, i.e. before any command runs.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DagError::UnknownDependency { .. } | DagError::CycleDetected(_)
        )
    }

    /// Errors caused by reading or parsing the configuration source.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            DagError::ConfigMissing
                | DagError::ConfigError(_)
                | DagError::IoError(_)
                | DagError::TomlError(_)
                | DagError::YamlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagError>;
