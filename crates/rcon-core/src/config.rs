//! Configuration file with named server environments
//!
//! ```toml
//! [default]
//! address = "127.0.0.1:16260"
//! password = "password"
//! log = "rcon-default.log"
//! type = "rcon"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::session::SessionFields;

/// Config file looked up next to the executable
pub const DEFAULT_CONFIG_NAME: &str = "rcon.toml";

/// Environment used when none is named
pub const DEFAULT_CONFIG_ENV: &str = "default";

/// Environment name to connection fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub environments: HashMap<String, SessionFields>,
}

impl Config {
    /// Load configuration from file; the extension selects the format
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path`, or the default file next to the executable
    ///
    /// A missing default file yields an empty config; a missing explicit
    /// file is an error.
    ///
    /// # Errors
    /// Returns error if a file exists but cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let path = default_path()?;
        if !path.exists() {
            debug!(path = %path.display(), "no config file found, using defaults");
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    /// Fields of environment `name`; all unset if it is missing
    #[must_use]
    pub fn environment(&self, name: &str) -> SessionFields {
        self.environments.get(name).cloned().unwrap_or_default()
    }
}

/// `rcon.toml` in the directory of the running executable
///
/// # Errors
/// Returns `ConfigError::Executable` if the executable path is unknown
pub fn default_path() -> Result<PathBuf, ConfigError> {
    let exe = std::env::current_exe().map_err(ConfigError::Executable)?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(DEFAULT_CONFIG_NAME))
}
