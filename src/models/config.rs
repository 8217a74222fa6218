use crate::error::ConfigError;
use crate::models::request::MAX_PAGE_SEG_MODE;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Directory name used under the platform config and data directories
pub const APP_DIR_NAME: &str = "tesseract-ocr-bridge";

/// Tesseract engine defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub default_language: String,
    pub tesseract_binary: String,
    /// Automatic page segmentation with orientation and script detection
    pub page_seg_mode: u8,
    pub variables: BTreeMap<String, String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_language: "eng".to_string(),
            tesseract_binary: "tesseract".to_string(),
            page_seg_mode: 1,
            variables: BTreeMap::new(),
        }
    }
}

/// Trained-data locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TessdataConfig {
    /// Read-only directory shipped with the application
    pub bundled_dir: Option<PathBuf>,
    /// Writable per-user directory the engine reads from
    pub data_dir: Option<PathBuf>,
    pub link_on_startup: bool,
}

impl Default for TessdataConfig {
    fn default() -> Self {
        Self {
            bundled_dir: None,
            data_dir: None,
            link_on_startup: true,
        }
    }
}

impl TessdataConfig {
    /// Bundled directory, defaulting to `tessdata` next to the executable
    pub fn resolve_bundled_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.bundled_dir {
            return Some(dir.clone());
        }

        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join("tessdata"))
    }

    /// Per-user directory, defaulting to the platform data directory
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Some(dir.clone());
        }

        dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join("tessdata"))
    }
}

/// Call handling limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeSettings {
    pub recognition_timeout_secs: u64,
    pub reuse_engine: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            recognition_timeout_secs: 120,
            reuse_engine: true,
        }
    }
}

impl BridgeSettings {
    pub fn recognition_timeout(&self) -> Duration {
        Duration::from_secs(self.recognition_timeout_secs)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Fallback filter when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "tesseract_ocr_bridge_lib=info,tesseract_ocr_bridge=info".to_string(),
        }
    }
}

/// Main bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BridgeConfig {
    pub engine: EngineSettings,
    pub tessdata: TessdataConfig,
    pub bridge: BridgeSettings,
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Reject settings the bridge cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.default_language.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "engine.default_language must not be empty".to_string(),
            ));
        }

        if self.engine.page_seg_mode > MAX_PAGE_SEG_MODE {
            return Err(ConfigError::Invalid(format!(
                "engine.page_seg_mode must be 0-{}, got {}",
                MAX_PAGE_SEG_MODE, self.engine.page_seg_mode
            )));
        }

        if self.bridge.recognition_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "bridge.recognition_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
