// src/config/mod.rs

//! Configuration loading and validation for dagrun.
//!
//! Responsibilities:
//! - Define the serde data model (`model.rs`).
//! - Load a config file from disk as TOML or YAML (`loader.rs`).
//! - Validate config-level invariants (`validate.rs`). Graph structure is
//!   validated later by `TaskGraph::validate`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str, ConfigFormat};
pub use model::{ConfigFile, ConfigSection, RawConfigFile, TaskConfig};
