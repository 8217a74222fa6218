pub mod engine;
pub mod image_loader;
pub mod tesseract;

// Re-export main types
pub use engine::{EngineConfig, EngineFactory, OcrEngine};
pub use image_loader::load_image;
pub use tesseract::{TesseractEngine, TesseractFactory};
