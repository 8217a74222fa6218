use super::engine::{EngineConfig, EngineFactory, OcrEngine};
use crate::error::EngineError;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// Tesseract OCR engine session, driving the `tesseract` executable
pub struct TesseractEngine {
    binary: PathBuf,
    config: EngineConfig,
}

impl TesseractEngine {
    /// Create a session for an already resolved binary
    pub fn new(binary: PathBuf, config: EngineConfig) -> Self {
        Self { binary, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the tesseract invocation for an image file
    fn build_command(&self, input: &Path, hocr: bool) -> Command {
        let mut command = Command::new(&self.binary);
        command.arg(input).arg("stdout");

        if let Some(dir) = &self.config.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }

        command
            .args(["-l", self.config.language_code()])
            .args(["--psm", &self.config.page_seg_mode.to_string()]);

        for (key, value) in &self.config.variables {
            command.arg("-c").arg(format!("{}={}", key, value));
        }

        if hocr {
            command.arg("hocr");
        }

        command
    }

    /// Write the image to a scratch PNG and run tesseract on it
    fn run(&self, image: &DynamicImage, hocr: bool) -> Result<String, EngineError> {
        let mut input = tempfile::Builder::new()
            .prefix("ocr-bridge-")
            .suffix(".png")
            .tempfile()?;
        image.write_to(&mut input, image::ImageFormat::Png)?;
        input.flush()?;

        let output = self.build_command(input.path(), hocr).output();

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(EngineError::Failed(format!(
                        "tesseract exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::Unavailable(
                format!("{} not found (install tesseract-ocr)", self.binary.display()),
            )),
            Err(e) => Err(EngineError::Io(e)),
        }
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<Option<String>, EngineError> {
        self.run(image, false).map(Some)
    }

    fn hocr(&self, image: &DynamicImage) -> Result<String, EngineError> {
        self.run(image, true)
    }
}

/// Builds [`TesseractEngine`] sessions from a binary name or path
pub struct TesseractFactory {
    binary: String,
}

impl TesseractFactory {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Resolve the configured binary against `PATH`
    pub fn resolve_binary(&self) -> Result<PathBuf, EngineError> {
        which::which(&self.binary).map_err(|e| {
            EngineError::Unavailable(format!(
                "{} not found ({}). Install with: apt install tesseract-ocr",
                self.binary, e
            ))
        })
    }

    /// Check if the tesseract binary can be found
    pub fn is_available(&self) -> bool {
        self.resolve_binary().is_ok()
    }
}

impl Default for TesseractFactory {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl EngineFactory for TesseractFactory {
    fn create(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, EngineError> {
        let binary = self.resolve_binary()?;
        tracing::debug!(
            binary = %binary.display(),
            language = config.language_code(),
            "Creating tesseract session"
        );
        Ok(Arc::new(TesseractEngine::new(binary, config.clone())))
    }
}
