pub mod channel;
#[cfg(feature = "tauri")]
pub mod commands;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

use std::path::Path;
use std::sync::Arc;

pub use error::{BridgeError, ConfigError, EngineError, LinkError};
pub use models::config::BridgeConfig;
pub use models::request::{MethodCall, OcrMethod, RecognitionRequest};
pub use services::bridge::OcrBridge;
pub use services::ocr::{EngineConfig, EngineFactory, OcrEngine};

use services::config::ConfigManager;

/// Overrides the platform config file location
pub const CONFIG_ENV_VAR: &str = "TESSERACT_OCR_BRIDGE_CONFIG";

/// Load configuration from `$TESSERACT_OCR_BRIDGE_CONFIG` or the platform config directory
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return ConfigManager::load_from(Path::new(&path));
    }

    ConfigManager::new()?.load()
}

/// Serve the method channel on stdin/stdout until stdin closes
pub async fn run() -> std::io::Result<()> {
    let (config, config_error) = match load_config() {
        Ok(config) => (config, None),
        Err(e) => (BridgeConfig::default(), Some(e)),
    };

    logging::init_logging(&config.logging);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
    }

    let bridge = Arc::new(OcrBridge::with_tesseract(config));
    match bridge.initialize() {
        Some(dir) => tracing::info!(tessdata = %dir.display(), "Trained data ready"),
        None => tracing::warn!("No trained-data directory, relying on the engine default"),
    }

    tracing::info!("Serving OCR method channel on stdio");
    channel::serve(bridge.clone(), tokio::io::stdin(), tokio::io::stdout()).await?;

    bridge.shutdown();
    Ok(())
}

/// Tauri plugin exposing `extract_text`, `extract_hocr` and `invoke_method`
#[cfg(feature = "tauri")]
pub fn init<R: tauri::Runtime>() -> tauri::plugin::TauriPlugin<R> {
    use commands::ocr::{extract_hocr, extract_text, invoke_method, OcrBridgeState};
    use tauri::Manager;

    tauri::plugin::Builder::new("tesseract-ocr")
        .invoke_handler(tauri::generate_handler![
            extract_text,
            extract_hocr,
            invoke_method
        ])
        .setup(|app, _api| {
            let config = load_config().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                BridgeConfig::default()
            });

            let bridge: OcrBridgeState = Arc::new(OcrBridge::with_tesseract(config));
            bridge.initialize();
            app.manage(bridge);
            Ok(())
        })
        .on_drop(|app| {
            if let Some(bridge) = app.try_state::<OcrBridgeState>() {
                bridge.shutdown();
            }
        })
        .build()
}
