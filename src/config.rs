//! Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Environment variable that overrides [Config::data_dir].
pub const DATA_DIR_ENV: &str = "MINIDB_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory of the file backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Write indented JSON documents.
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./db_data")
}

fn default_pretty() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Loads a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Applies overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}
