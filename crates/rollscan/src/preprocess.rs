//! OCR pre-processing.
//!
//! Deterministic and side-effect-free: grayscale conversion, a conditional
//! 2x Lanczos upscale for cards below the recognizer's comfortable DPI,
//! and mild contrast/sharpness boosts tuned for the card template. The
//! step never fails; a no-op configuration passes the image through.

use crate::config::PreprocessConfig;
use image::{DynamicImage, imageops::FilterType};

/// Prepare a card image for recognition.
pub fn prepare_for_ocr(image: &DynamicImage, config: &PreprocessConfig) -> DynamicImage {
    let mut prepared = image.grayscale();

    if prepared.width() < config.min_width && config.upscale_factor > 1 {
        prepared = prepared.resize(
            prepared.width() * config.upscale_factor,
            prepared.height() * config.upscale_factor,
            FilterType::Lanczos3,
        );
    }

    if (config.contrast - 1.0).abs() > f32::EPSILON {
        prepared = prepared.adjust_contrast((config.contrast - 1.0) * 100.0);
    }
    if config.sharpness > 1.0 {
        prepared = prepared.unsharpen(config.sharpness - 1.0, 1);
    }

    prepared
}
