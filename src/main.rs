#[tokio::main]
async fn main() -> std::io::Result<()> {
    tesseract_ocr_bridge_lib::run().await
}
