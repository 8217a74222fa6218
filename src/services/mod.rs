pub mod bridge;
pub mod config;
pub mod ocr;
pub mod tessdata;
