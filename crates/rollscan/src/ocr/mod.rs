//! OCR subsystem.
//!
//! The recognizer is an opaque capability behind the [`TextRecognizer`]
//! trait; the production backend shells out to the Tesseract binary. The
//! [`OcrDispatcher`] fans a card batch out over a bounded worker pool and
//! collects outcomes in submission order, degrading individual task
//! failures to empty text.

pub mod dispatcher;
pub mod tesseract;

pub use dispatcher::OcrDispatcher;
pub use tesseract::TesseractRecognizer;

use crate::error::Result;
use async_trait::async_trait;
use image::DynamicImage;

/// Opaque text-recognition capability.
///
/// Implementations must tolerate degraded or garbled input without
/// failing; they may fail hard on corrupt image data or recognizer
/// crashes, which the dispatcher maps to an empty outcome.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image: &DynamicImage) -> Result<String>;
}
