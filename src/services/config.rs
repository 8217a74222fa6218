use crate::error::ConfigError;
use crate::models::config::{BridgeConfig, APP_DIR_NAME};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration manager for bridge settings
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a manager for the platform config directory.
    ///
    /// The directory itself is created on the first save.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join(APP_DIR_NAME);

        Ok(Self::at(config_dir))
    }

    /// Create a manager rooted at an explicit directory
    pub fn at(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        let config_path = config_dir.join("config.json");

        Self {
            config_dir,
            config_path,
        }
    }

    /// Save configuration to disk
    pub fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;

        // Pretty print for human readability
        let json = serde_json::to_string_pretty(config)?;

        fs::write(&self.config_path, json).map_err(|source| ConfigError::Io {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Load configuration from disk
    ///
    /// If config file doesn't exist, returns default configuration
    pub fn load(&self) -> Result<BridgeConfig, ConfigError> {
        if !self.config_exists() {
            return Ok(BridgeConfig::default());
        }

        Self::load_from(&self.config_path)
    }

    /// Load and validate a config file at an arbitrary path
    pub fn load_from(path: &Path) -> Result<BridgeConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: BridgeConfig = serde_json::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Get the config file path
    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Check if config file exists
    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}
