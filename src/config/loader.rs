//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{ConfigFile, ConfigSnapshot};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in '{path}': {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Parse a config file. `.toml` files are read as TOML, anything else as JSON.
///
/// Fields the file omits stay absent; nothing is defaulted here.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Somewhere a (possibly partial) snapshot can be re-read from.
pub trait SnapshotSource: Send + Sync {
    /// Load a fresh snapshot. Absent fields must be left absent.
    fn load(&self) -> Result<ConfigSnapshot, ConfigError>;

    /// Human-readable name for logging.
    fn describe(&self) -> String;
}

/// Snapshot source backed by the config file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSource {
    fn load(&self) -> Result<ConfigSnapshot, ConfigError> {
        load_config_file(&self.path).map(|file| file.snapshot)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
