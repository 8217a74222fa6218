use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single bridge call.
///
/// Each variant maps to exactly one reply string through [`BridgeError::reply_message`].
/// The first five strings are a fixed contract with existing callers and must not change.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("call carried no arguments")]
    MissingArguments,

    #[error("arguments are not a valid mapping: {0}")]
    MalformedArguments(String),

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("imageBytes could not be decoded as an image")]
    DecodeBytes,

    #[error("imagePath could not be loaded as an image")]
    LoadPath,

    #[error("neither imagePath nor imageBytes was supplied")]
    MissingImageSource,

    #[error("invalid page segmentation mode: {0}")]
    InvalidPageSegMode(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("recognition produced no result")]
    RecognitionFailed,

    #[error("recognition timed out after {0}s")]
    Timeout(u64),
}

impl BridgeError {
    /// Reply string sent back over the host channel.
    pub fn reply_message(&self) -> String {
        match self {
            BridgeError::MissingArguments => {
                "iOS could not recognize flutter arguments in method: (sendParams)".to_string()
            }
            BridgeError::MalformedArguments(e) => format!("Malformed arguments: {}", e),
            BridgeError::UnsupportedMethod(m) => format!("Unsupported method: {}", m),
            BridgeError::DecodeBytes => "Failed to decode image from imageBytes".to_string(),
            BridgeError::LoadPath => "Failed to load image from imagePath".to_string(),
            BridgeError::MissingImageSource => {
                "You must provide either imagePath or imageBytes".to_string()
            }
            BridgeError::InvalidPageSegMode(v) => {
                format!("Invalid page segmentation mode: {}", v)
            }
            BridgeError::EngineUnavailable(e) => format!("OCR engine unavailable: {}", e),
            BridgeError::RecognitionFailed => "OCR failed to extract text".to_string(),
            BridgeError::Timeout(secs) => format!("OCR timed out after {} seconds", secs),
        }
    }
}

/// Errors raised by an OCR engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine not available: {0}")]
    Unavailable(String),

    #[error("recognition failed: {0}")]
    Failed(String),

    #[error("failed to encode image for engine: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors while loading or saving the bridge configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine config directory")]
    NoConfigDir,

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors while linking the bundled trained-data directory.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("bundled trained-data directory not found: {0}")]
    MissingBundle(PathBuf),

    #[error("no writable data directory could be determined")]
    NoDataDir,

    #[error("failed to link {link} -> {target}: {source}")]
    Io {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_reply_strings() {
        assert_eq!(
            BridgeError::MissingArguments.reply_message(),
            "iOS could not recognize flutter arguments in method: (sendParams)"
        );
        assert_eq!(
            BridgeError::DecodeBytes.reply_message(),
            "Failed to decode image from imageBytes"
        );
        assert_eq!(
            BridgeError::LoadPath.reply_message(),
            "Failed to load image from imagePath"
        );
        assert_eq!(
            BridgeError::MissingImageSource.reply_message(),
            "You must provide either imagePath or imageBytes"
        );
        assert_eq!(
            BridgeError::RecognitionFailed.reply_message(),
            "OCR failed to extract text"
        );
    }

    #[test]
    fn test_unsupported_method_names_the_method() {
        let reply = BridgeError::UnsupportedMethod("extractPdf".to_string()).reply_message();
        assert_eq!(reply, "Unsupported method: extractPdf");
    }

    #[test]
    fn test_timeout_reply() {
        assert_eq!(
            BridgeError::Timeout(30).reply_message(),
            "OCR timed out after 30 seconds"
        );
    }
}
