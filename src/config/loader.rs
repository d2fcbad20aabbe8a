// src/config/loader.rs

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// On-disk syntax of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml` / `.yml` select YAML; anything else is read as TOML.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Deserialize config text without semantic validation.
pub fn parse_str(contents: &str, format: ConfigFormat) -> Result<RawConfigFile> {
    let raw: RawConfigFile = match format {
        ConfigFormat::Toml => toml::from_str(contents)?,
        ConfigFormat::Yaml => serde_yaml::from_str(contents)?,
    };
    Ok(raw)
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs deserialization; it does **not** validate anything.
/// Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path);
    debug!(path = %path.display(), ?format, "reading config");

    let contents = fs::read_to_string(path)?;
    parse_str(&contents, format)
}

/// Load a configuration file and check config-level invariants.
///
/// Graph invariants (unknown dependencies, cycles) are *not* checked here;
/// those belong to `TaskGraph::validate`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}
