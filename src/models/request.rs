use crate::error::BridgeError;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Highest page segmentation mode Tesseract understands (`--psm 13`, raw line).
pub const MAX_PAGE_SEG_MODE: u8 = 13;

/// One inbound call from the host runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Option<serde_json::Value>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Methods the bridge answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcrMethod {
    ExtractText,
    ExtractHocr,
}

impl OcrMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrMethod::ExtractText => "extractText",
            OcrMethod::ExtractHocr => "extractHocr",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "extractText" => Some(OcrMethod::ExtractText),
            "extractHocr" => Some(OcrMethod::ExtractHocr),
            _ => None,
        }
    }
}

impl fmt::Display for OcrMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw image bytes as they arrive over a JSON bridge: either a byte array or base64 text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ImageBytes {
    Raw(Vec<u8>),
    Base64(String),
}

impl ImageBytes {
    pub fn into_bytes(self) -> Result<Vec<u8>, BridgeError> {
        match self {
            ImageBytes::Raw(bytes) => Ok(bytes),
            ImageBytes::Base64(text) => base64::engine::general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|_| BridgeError::DecodeBytes),
        }
    }
}

/// Argument bag of `extractText` / `extractHocr`.
///
/// The bag itself must be a mapping. The image, language and data-dir keys
/// treat a value of the wrong type as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallArguments {
    #[serde(default, deserialize_with = "lenient")]
    pub image_path: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub image_bytes: Option<ImageBytes>,
    #[serde(default, deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tess_data: Option<String>,
    #[serde(default)]
    pub args: Option<BTreeMap<String, serde_json::Value>>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl CallArguments {
    /// Decode the untyped argument value of a call.
    pub fn from_value(value: Option<serde_json::Value>) -> Result<Self, BridgeError> {
        match value {
            None | Some(serde_json::Value::Null) => Err(BridgeError::MissingArguments),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| BridgeError::MalformedArguments(e.to_string())),
        }
    }
}

/// Where the image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    FilePath(PathBuf),
    InlineBytes(Vec<u8>),
}

/// Language the engine session is built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum LanguageSelector {
    #[default]
    Default,
    Custom(String),
}

impl LanguageSelector {
    /// Blank codes fall back to the default language.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some(code) if !code.is_empty() => LanguageSelector::Custom(code.to_string()),
            _ => LanguageSelector::Default,
        }
    }

    /// The Tesseract language code, given the configured default.
    pub fn code<'a>(&'a self, default_language: &'a str) -> &'a str {
        match self {
            LanguageSelector::Default => default_language,
            LanguageSelector::Custom(code) => code,
        }
    }
}

/// Per-call engine options supplied through the `args` map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub page_seg_mode: Option<u8>,
    pub variables: BTreeMap<String, String>,
}

impl EngineOptions {
    fn from_args(args: BTreeMap<String, serde_json::Value>) -> Result<Self, BridgeError> {
        let mut options = EngineOptions::default();

        for (key, value) in args {
            let value = scalar_to_string(&key, value)?;
            if key == "psm" {
                options.page_seg_mode = Some(parse_page_seg_mode(&value)?);
            } else {
                options.variables.insert(key, value);
            }
        }

        Ok(options)
    }
}

fn scalar_to_string(key: &str, value: serde_json::Value) -> Result<String, BridgeError> {
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(BridgeError::MalformedArguments(format!(
            "args.{} must be a string, number or boolean, got {}",
            key, other
        ))),
    }
}

pub fn parse_page_seg_mode(value: &str) -> Result<u8, BridgeError> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|psm| *psm <= MAX_PAGE_SEG_MODE)
        .ok_or_else(|| BridgeError::InvalidPageSegMode(value.to_string()))
}

/// A validated recognition request, decoded once at the bridge boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub operation: OcrMethod,
    pub image_source: ImageSource,
    pub language: LanguageSelector,
    pub tessdata_dir: Option<PathBuf>,
    pub options: EngineOptions,
}

impl RecognitionRequest {
    /// Decode a raw method call.
    ///
    /// Checks run in the order the host contract expects: method name, argument
    /// presence, argument shape, engine options, then the image source.
    pub fn from_call(call: MethodCall) -> Result<Self, BridgeError> {
        let operation = OcrMethod::from_name(&call.method)
            .ok_or_else(|| BridgeError::UnsupportedMethod(call.method.clone()))?;
        let arguments = CallArguments::from_value(call.arguments)?;
        Self::from_arguments(operation, arguments)
    }

    pub fn from_arguments(
        operation: OcrMethod,
        arguments: CallArguments,
    ) -> Result<Self, BridgeError> {
        let language = LanguageSelector::from_code(arguments.language.as_deref());
        let options = match arguments.args {
            Some(args) => EngineOptions::from_args(args)?,
            None => EngineOptions::default(),
        };
        let tessdata_dir = arguments
            .tess_data
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let image_source = if let Some(bytes) = arguments.image_bytes {
            ImageSource::InlineBytes(bytes.into_bytes()?)
        } else if let Some(path) = arguments.image_path {
            ImageSource::FilePath(PathBuf::from(path))
        } else {
            return Err(BridgeError::MissingImageSource);
        };

        Ok(Self {
            operation,
            image_source,
            language,
            tessdata_dir,
            options,
        })
    }
}
