// LinkShelf host configuration
// Loads the host process config (data directory, scheduler intervals, log
// filter) from a JSON file at the platform-specific config path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform;
use crate::types::config::HostConfig;
use crate::types::errors::ConfigError;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LINKSHELF_DATA_DIR";

/// File name of the SQLite database inside the data directory.
pub const DATABASE_FILE: &str = "linkshelf.db";

/// Reads and writes the host config file.
pub struct HostConfigStore {
    config_path: PathBuf,
    config: HostConfig,
}

impl HostConfigStore {
    /// Uses `path_override` if given, otherwise `config.json` in the
    /// platform config directory.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join("config.json"));
        Self {
            config_path,
            config: HostConfig::default(),
        }
    }

    /// Loads the config file. A missing file yields the defaults; a
    /// malformed one is an error.
    pub fn load(&mut self) -> Result<HostConfig, ConfigError> {
        if !self.config_path.exists() {
            self.config = HostConfig::default();
            return Ok(self.config.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| ConfigError::IoError(format!("Failed to read config file: {}", e)))?;
        self.config = serde_json::from_str(&content).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Ok(self.config.clone())
    }

    /// Writes the current config, creating parent directories as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }
        let json = serde_json::to_string_pretty(&self.config).map_err(|e| {
            ConfigError::SerializationError(format!("Failed to serialize config: {}", e))
        })?;
        fs::write(&self.config_path, json)
            .map_err(|e| ConfigError::IoError(format!("Failed to write config file: {}", e)))
    }

    pub fn get_config(&self) -> &HostConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: HostConfig) {
        self.config = config;
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Resolves the data directory: `LINKSHELF_DATA_DIR`, then the config's
/// `data_dir`, then the platform data directory.
pub fn resolve_data_dir(config: &HostConfig) -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    match &config.data_dir {
        Some(dir) => PathBuf::from(dir),
        None => platform::get_data_dir(),
    }
}
