use crate::models::request::{CallArguments, ImageBytes, MethodCall, OcrMethod, RecognitionRequest};
use crate::services::bridge::OcrBridge;
use std::collections::BTreeMap;
use std::sync::Arc;
use tauri::State;

/// State wrapper for the bridge (shared by all commands)
pub type OcrBridgeState = Arc<OcrBridge>;

/// Decode typed command parameters and run them through the bridge.
/// Errors carry the same reply strings as the method channel.
async fn run_command(
    bridge: &OcrBridge,
    method: OcrMethod,
    arguments: CallArguments,
) -> Result<String, String> {
    let request =
        RecognitionRequest::from_arguments(method, arguments).map_err(|e| e.reply_message())?;
    bridge.recognize(request).await.map_err(|e| e.reply_message())
}

/// Recognize plain text from an image path or image bytes
#[tauri::command]
pub async fn extract_text(
    state: State<'_, OcrBridgeState>,
    image_path: Option<String>,
    image_bytes: Option<ImageBytes>,
    language: Option<String>,
    tess_data: Option<String>,
    args: Option<BTreeMap<String, serde_json::Value>>,
) -> Result<String, String> {
    let arguments = CallArguments {
        image_path,
        image_bytes,
        language,
        tess_data,
        args,
    };
    run_command(state.inner(), OcrMethod::ExtractText, arguments).await
}

/// Generate hOCR markup from an image path or image bytes
#[tauri::command]
pub async fn extract_hocr(
    state: State<'_, OcrBridgeState>,
    image_path: Option<String>,
    image_bytes: Option<ImageBytes>,
    language: Option<String>,
    tess_data: Option<String>,
    args: Option<BTreeMap<String, serde_json::Value>>,
) -> Result<String, String> {
    let arguments = CallArguments {
        image_path,
        image_bytes,
        language,
        tess_data,
        args,
    };
    run_command(state.inner(), OcrMethod::ExtractHocr, arguments).await
}

/// Generic method call with the single-string reply contract (errors are replies too)
#[tauri::command]
pub async fn invoke_method(
    state: State<'_, OcrBridgeState>,
    method: String,
    arguments: Option<serde_json::Value>,
) -> Result<String, String> {
    Ok(state.inner().invoke(MethodCall::new(method, arguments)).await)
}
