use crate::error::BridgeError;
use crate::models::request::ImageSource;
use image::DynamicImage;

/// Decode the request image, mapping failures to the reply the host expects
pub fn load_image(source: &ImageSource) -> Result<DynamicImage, BridgeError> {
    match source {
        ImageSource::InlineBytes(bytes) => image::load_from_memory(bytes).map_err(|e| {
            tracing::debug!(len = bytes.len(), error = %e, "Failed to decode imageBytes");
            BridgeError::DecodeBytes
        }),
        ImageSource::FilePath(path) => image::open(path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "Failed to load imagePath");
            BridgeError::LoadPath
        }),
    }
}
