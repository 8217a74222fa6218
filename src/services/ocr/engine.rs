use crate::error::EngineError;
use crate::models::config::EngineSettings;
use crate::models::request::{LanguageSelector, RecognitionRequest};
use image::DynamicImage;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// OCR Engine trait - one configured engine session
pub trait OcrEngine: Send + Sync {
    /// Recognize plain text. `Ok(None)` means the engine produced no result.
    fn recognize(&self, image: &DynamicImage) -> Result<Option<String>, EngineError>;

    /// Generate hOCR markup for the same image
    fn hocr(&self, image: &DynamicImage) -> Result<String, EngineError>;
}

/// Everything an engine session is built from. Two calls with equal configs can share a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub language: LanguageSelector,
    pub default_language: String,
    pub tessdata_dir: Option<PathBuf>,
    pub page_seg_mode: u8,
    pub variables: BTreeMap<String, String>,
}

impl EngineConfig {
    /// Merge configured defaults with the per-call options of a request.
    ///
    /// `fallback_tessdata` is the linked per-user directory, used when the call names none.
    pub fn for_request(
        settings: &EngineSettings,
        request: &RecognitionRequest,
        fallback_tessdata: Option<PathBuf>,
    ) -> Self {
        let mut variables = settings.variables.clone();
        variables.extend(request.options.variables.clone());

        Self {
            language: request.language.clone(),
            default_language: settings.default_language.clone(),
            tessdata_dir: request.tessdata_dir.clone().or(fallback_tessdata),
            page_seg_mode: request
                .options
                .page_seg_mode
                .unwrap_or(settings.page_seg_mode),
            variables,
        }
    }

    pub fn language_code(&self) -> &str {
        self.language.code(&self.default_language)
    }
}

/// Builds engine sessions
pub trait EngineFactory: Send + Sync {
    fn create(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, EngineError>;
}
