use crate::error::BridgeError;
use crate::models::request::OcrMethod;

/// Outcome of one bridge call before it is flattened for the wire.
pub type RecognitionResult = Result<String, BridgeError>;

/// Flatten a result into the single reply string the host channel carries.
/// Success and failure share the same slot.
pub fn into_reply(result: RecognitionResult) -> String {
    match result {
        Ok(payload) => payload,
        Err(e) => e.reply_message(),
    }
}

/// Engine output for one image
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub text: String,
    /// Present only for `extractHocr`
    pub hocr: Option<String>,
}

impl EngineOutput {
    /// Payload replied for the given method
    pub fn payload_for(self, method: OcrMethod) -> Option<String> {
        match method {
            OcrMethod::ExtractText => Some(self.text),
            OcrMethod::ExtractHocr => self.hocr,
        }
    }
}
