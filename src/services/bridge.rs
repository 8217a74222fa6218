use crate::error::{BridgeError, EngineError};
use crate::models::config::BridgeConfig;
use crate::models::ocr_result::{into_reply, EngineOutput, RecognitionResult};
use crate::models::request::{MethodCall, OcrMethod, RecognitionRequest};
use crate::services::ocr::{load_image, EngineConfig, EngineFactory, OcrEngine, TesseractFactory};
use crate::services::tessdata::TessdataLink;
use image::DynamicImage;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::oneshot;

/// Last engine session, reused while calls keep the same configuration
struct CachedSession {
    config: EngineConfig,
    engine: Arc<dyn OcrEngine>,
}

/// Translates host method calls into OCR engine invocations.
///
/// One bridge serves any number of concurrent calls. The only state shared
/// between calls is the cached engine session and the trained-data directory,
/// which is prepared once.
pub struct OcrBridge {
    config: BridgeConfig,
    factory: Arc<dyn EngineFactory>,
    session: Mutex<Option<CachedSession>>,
    data_dir: OnceLock<Option<PathBuf>>,
}

impl OcrBridge {
    pub fn new(config: BridgeConfig, factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            config,
            factory,
            session: Mutex::new(None),
            data_dir: OnceLock::new(),
        }
    }

    /// Bridge backed by the system `tesseract` binary
    pub fn with_tesseract(config: BridgeConfig) -> Self {
        let factory = TesseractFactory::new(config.engine.tesseract_binary.clone());
        Self::new(config, Arc::new(factory))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Prepare the trained-data directory. Runs once; later calls return the cached outcome.
    pub fn initialize(&self) -> Option<&Path> {
        self.data_dir
            .get_or_init(|| prepare_data_dir(&self.config))
            .as_deref()
    }

    /// Handle one call and flatten the outcome into the reply string
    pub async fn invoke(&self, call: MethodCall) -> String {
        into_reply(self.handle(call).await)
    }

    /// Handle one call
    pub async fn handle(&self, call: MethodCall) -> RecognitionResult {
        let started = Instant::now();
        let method = call.method.clone();
        tracing::debug!(method = %method, "Handling method call");

        let result = match RecognitionRequest::from_call(call) {
            Ok(request) => self.recognize(request).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(payload) => tracing::info!(
                method = %method,
                chars = payload.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Method call completed"
            ),
            Err(e) => tracing::info!(
                method = %method,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Method call failed"
            ),
        }

        result
    }

    /// Run a decoded request through the engine
    pub async fn recognize(&self, request: RecognitionRequest) -> RecognitionResult {
        let fallback_tessdata = self.prepared_data_dir().await;
        let engine_config =
            EngineConfig::for_request(&self.config.engine, &request, fallback_tessdata);

        let source = request.image_source;
        let image = tokio::task::spawn_blocking(move || load_image(&source))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Image decoding task failed");
                BridgeError::RecognitionFailed
            })??;

        let engine = self.engine_for(&engine_config)?;
        let operation = request.operation;

        let (tx, rx) = oneshot::channel();
        tokio::task::spawn_blocking(move || {
            let outcome = run_engine(engine.as_ref(), &image, operation);
            // Receiver is gone when the call already timed out
            let _ = tx.send(outcome);
        });

        let timeout = self.config.bridge.recognition_timeout();
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => {
                tracing::error!("Recognition worker exited without a result");
                Err(BridgeError::RecognitionFailed)
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    language = engine_config.language_code(),
                    "Recognition timed out"
                );
                Err(BridgeError::Timeout(timeout.as_secs()))
            }
        }
    }

    /// Trained-data directory for a call. The first call without an eager
    /// `initialize` prepares it on a blocking worker.
    async fn prepared_data_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = self.data_dir.get() {
            return dir.clone();
        }

        let config = self.config.clone();
        match tokio::task::spawn_blocking(move || prepare_data_dir(&config)).await {
            Ok(prepared) => self.data_dir.get_or_init(|| prepared).clone(),
            Err(e) => {
                tracing::error!(error = %e, "Trained-data preparation task failed");
                None
            }
        }
    }

    /// Release the cached engine session
    pub fn shutdown(&self) {
        if self.session.lock().take().is_some() {
            tracing::info!("Released OCR engine session");
        }
    }

    fn engine_for(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, BridgeError> {
        if !self.config.bridge.reuse_engine {
            return self.factory.create(config).map_err(engine_unavailable);
        }

        let mut session = self.session.lock();
        if let Some(cached) = session.as_ref() {
            if cached.config == *config {
                return Ok(cached.engine.clone());
            }
        }

        let engine = self.factory.create(config).map_err(engine_unavailable)?;
        tracing::debug!(language = config.language_code(), "Created OCR engine session");
        *session = Some(CachedSession {
            config: config.clone(),
            engine: engine.clone(),
        });

        Ok(engine)
    }
}

fn engine_unavailable(e: EngineError) -> BridgeError {
    tracing::error!(error = %e, "Failed to create OCR engine");
    match e {
        EngineError::Unavailable(reason) => BridgeError::EngineUnavailable(reason),
        other => BridgeError::EngineUnavailable(other.to_string()),
    }
}

/// Blocking part of a call: recognition, then hOCR generation when asked for
fn run_engine(engine: &dyn OcrEngine, image: &DynamicImage, method: OcrMethod) -> RecognitionResult {
    let text = match engine.recognize(image) {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::warn!(method = %method, "Engine returned no result");
            return Err(BridgeError::RecognitionFailed);
        }
        Err(e) => {
            tracing::error!(method = %method, error = %e, "Recognition failed");
            return Err(BridgeError::RecognitionFailed);
        }
    };

    let hocr = match method {
        OcrMethod::ExtractText => None,
        OcrMethod::ExtractHocr => Some(engine.hocr(image).map_err(|e| {
            tracing::error!(error = %e, "hOCR generation failed");
            BridgeError::RecognitionFailed
        })?),
    };

    EngineOutput { text, hocr }
        .payload_for(method)
        .ok_or(BridgeError::RecognitionFailed)
}

/// Link the bundled trained data into the per-user directory and report where the engine should look
fn prepare_data_dir(config: &BridgeConfig) -> Option<PathBuf> {
    if !config.tessdata.link_on_startup {
        return config.tessdata.resolve_data_dir().filter(|dir| dir.is_dir());
    }

    let link = match TessdataLink::from_config(&config.tessdata) {
        Ok(link) => link,
        Err(e) => {
            tracing::warn!(error = %e, "Could not resolve trained-data directories");
            return None;
        }
    };

    if let Err(e) = link.ensure() {
        tracing::warn!(error = %e, "Failed to link trained-data directory, continuing");
    }

    let data_dir = link.data_dir();
    data_dir.is_dir().then(|| data_dir.to_path_buf())
}
