use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tesseract_ocr_bridge_lib::models::request::LanguageSelector;
use tesseract_ocr_bridge_lib::{
    BridgeConfig, EngineConfig, EngineError, EngineFactory, MethodCall, OcrBridge, OcrEngine,
};

const PLAIN_TEXT: &str = "The quick brown fox";

struct StubEngine {
    language: String,
}

impl OcrEngine for StubEngine {
    fn recognize(&self, _image: &DynamicImage) -> Result<Option<String>, EngineError> {
        Ok(Some(PLAIN_TEXT.to_string()))
    }

    fn hocr(&self, image: &DynamicImage) -> Result<String, EngineError> {
        Ok(format!(
            "<div class='ocr_page' title='bbox 0 0 {} {}' lang='{}'></div>",
            image.width(),
            image.height(),
            self.language
        ))
    }
}

/// Records every session configuration the bridge asks for
#[derive(Default)]
struct RecordingFactory {
    configs: Mutex<Vec<EngineConfig>>,
}

impl EngineFactory for RecordingFactory {
    fn create(&self, config: &EngineConfig) -> Result<Arc<dyn OcrEngine>, EngineError> {
        self.configs.lock().push(config.clone());
        Ok(Arc::new(StubEngine {
            language: config.language_code().to_string(),
        }))
    }
}

fn setup() -> (OcrBridge, Arc<RecordingFactory>) {
    let mut config = BridgeConfig::default();
    config.tessdata.link_on_startup = false;
    config.tessdata.data_dir = Some("/nonexistent/tessdata".into());

    let factory = Arc::new(RecordingFactory::default());
    (OcrBridge::new(config, factory.clone()), factory)
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_no_arguments_reply() {
    let (bridge, _) = setup();

    for method in ["extractText", "extractHocr"] {
        let reply = bridge.invoke(MethodCall::new(method, None)).await;
        assert_eq!(
            reply,
            "iOS could not recognize flutter arguments in method: (sendParams)"
        );
    }
}

#[tokio::test]
async fn test_no_image_source_reply() {
    let (bridge, factory) = setup();

    let reply = bridge
        .invoke(MethodCall::new("extractText", Some(json!({ "language": "eng" }))))
        .await;

    assert_eq!(reply, "You must provide either imagePath or imageBytes");
    assert!(factory.configs.lock().is_empty());
}

#[tokio::test]
async fn test_wrong_typed_values_are_ignored() {
    let (bridge, factory) = setup();

    let reply = bridge
        .invoke(MethodCall::new("extractText", Some(json!({ "imagePath": 7 }))))
        .await;
    assert_eq!(reply, "You must provide either imagePath or imageBytes");

    let reply = bridge
        .invoke(MethodCall::new(
            "extractText",
            Some(json!({ "imageBytes": png_bytes(8, 8), "language": 5 })),
        ))
        .await;
    assert_eq!(reply, PLAIN_TEXT);
    assert_eq!(factory.configs.lock()[0].language, LanguageSelector::Default);
}

#[tokio::test]
async fn test_undecodable_bytes_reply() {
    let (bridge, _) = setup();

    let reply = bridge
        .invoke(MethodCall::new(
            "extractText",
            Some(json!({ "imageBytes": b"GIF89a but not really".to_vec() })),
        ))
        .await;

    assert_eq!(reply, "Failed to decode image from imageBytes");
}

#[tokio::test]
async fn test_missing_path_reply() {
    let (bridge, _) = setup();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("scan.png");

    let reply = bridge
        .invoke(MethodCall::new(
            "extractHocr",
            Some(json!({ "imagePath": missing.to_str().unwrap() })),
        ))
        .await;

    assert_eq!(reply, "Failed to load image from imagePath");
}

#[tokio::test]
async fn test_extract_text_from_path() {
    let (bridge, _) = setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scan.png");
    std::fs::write(&path, png_bytes(40, 20)).unwrap();

    let reply = bridge
        .invoke(MethodCall::new(
            "extractText",
            Some(json!({ "imagePath": path.to_str().unwrap() })),
        ))
        .await;

    assert_eq!(reply, PLAIN_TEXT);
}

#[tokio::test]
async fn test_extract_hocr_replies_with_markup() {
    let (bridge, _) = setup();

    let reply = bridge
        .invoke(MethodCall::new(
            "extractHocr",
            Some(json!({ "imageBytes": png_bytes(40, 20) })),
        ))
        .await;

    assert_ne!(reply, PLAIN_TEXT);
    assert_eq!(
        reply,
        "<div class='ocr_page' title='bbox 0 0 40 20' lang='eng'></div>"
    );
}

#[tokio::test]
async fn test_custom_language_configuration() {
    let (bridge, factory) = setup();

    bridge
        .invoke(MethodCall::new(
            "extractText",
            Some(json!({ "imageBytes": png_bytes(8, 8), "language": "fra" })),
        ))
        .await;
    bridge
        .invoke(MethodCall::new(
            "extractText",
            Some(json!({ "imageBytes": png_bytes(8, 8) })),
        ))
        .await;

    let configs = factory.configs.lock();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0].language, LanguageSelector::Custom("fra".to_string()));
    assert_eq!(configs[1].language, LanguageSelector::Default);
    assert_ne!(configs[0], configs[1]);
}

#[tokio::test]
async fn test_unknown_method_gets_explicit_reply() {
    let (bridge, _) = setup();

    let reply = bridge
        .invoke(MethodCall::new(
            "extractBarcode",
            Some(json!({ "imageBytes": png_bytes(8, 8) })),
        ))
        .await;

    assert_eq!(reply, "Unsupported method: extractBarcode");
}

#[tokio::test]
async fn test_concurrent_calls_each_get_a_reply() {
    let (bridge, _) = setup();
    let bridge = Arc::new(bridge);

    let mut handles = Vec::new();
    for i in 0..8 {
        let bridge = bridge.clone();
        handles.push(tokio::spawn(async move {
            let method = if i % 2 == 0 { "extractText" } else { "extractHocr" };
            bridge
                .invoke(MethodCall::new(
                    method,
                    Some(json!({ "imageBytes": png_bytes(10 + i, 10) })),
                ))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let reply = handle.await.unwrap();
        if i % 2 == 0 {
            assert_eq!(reply, PLAIN_TEXT);
        } else {
            assert!(reply.starts_with("<div class='ocr_page'"));
        }
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_data_link_setup_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    let bundled = root.path().join("app").join("tessdata");
    std::fs::create_dir_all(&bundled).unwrap();
    let user_dir = root.path().join("home").join("tessdata");

    let mut config = BridgeConfig::default();
    config.tessdata.bundled_dir = Some(bundled.clone());
    config.tessdata.data_dir = Some(user_dir.clone());

    // Two bridges in one process: the second finds the link already in place
    let first = OcrBridge::new(config.clone(), Arc::new(RecordingFactory::default()));
    let second = OcrBridge::new(config, Arc::new(RecordingFactory::default()));
    assert_eq!(first.initialize(), Some(user_dir.as_path()));
    assert_eq!(second.initialize(), Some(user_dir.as_path()));

    let reply = second
        .invoke(MethodCall::new(
            "extractText",
            Some(json!({ "imageBytes": png_bytes(8, 8) })),
        ))
        .await;
    assert_eq!(reply, PLAIN_TEXT);
    assert_eq!(std::fs::read_link(&user_dir).unwrap(), bundled);
}
