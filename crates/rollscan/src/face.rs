//! Photograph-region cropping.
//!
//! The voter photo sits in a fixed position on the card template, so the
//! crop is a pure geometric heuristic driven by proportional ratios of the
//! card's width and height. There is no face detection.

use crate::config::FaceRegionConfig;
use crate::types::CardImage;
use image::DynamicImage;
use std::io::Cursor;

/// Crop the photograph region out of a card.
///
/// Returns `None` (not an error) when the clamped rectangle has
/// non-positive width or height, which happens for degenerate card sizes.
pub fn crop_face(card: &CardImage, config: &FaceRegionConfig) -> Option<DynamicImage> {
    let (w, h) = (card.width(), card.height());

    let left = (w as f32 * config.left_ratio) as u32;
    let top = (h as f32 * config.top_ratio) as u32;
    let right = ((w as f32 * config.right_ratio) as u32).min(w);
    let bottom = ((h as f32 * config.bottom_ratio) as u32).min(h);

    if right <= left || bottom <= top {
        return None;
    }

    let face = card
        .as_image()
        .crop_imm(left, top, right - left, bottom - top);
    Some(enhance(face, config))
}

/// Crop the photograph region and re-encode it as a compact lossy buffer
/// suitable for spreadsheet embedding.
pub fn crop_face_jpeg(card: &CardImage, config: &FaceRegionConfig) -> Option<Vec<u8>> {
    let face = crop_face(card, config)?;
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        Cursor::new(&mut bytes),
        config.jpeg_quality,
    );
    match face.to_rgb8().write_with_encoder(encoder) {
        Ok(()) => Some(bytes),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode face crop, dropping thumbnail");
            None
        }
    }
}

fn enhance(face: DynamicImage, config: &FaceRegionConfig) -> DynamicImage {
    let mut face = face;
    if (config.contrast - 1.0).abs() > f32::EPSILON {
        face = face.adjust_contrast((config.contrast - 1.0) * 100.0);
    }
    if config.sharpness > 1.0 {
        face = face.unsharpen(config.sharpness - 1.0, 1);
    }
    face
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_card(width: u32, height: u32) -> CardImage {
        CardImage::new(DynamicImage::new_rgb8(width, height))
    }

    fn no_enhance() -> FaceRegionConfig {
        FaceRegionConfig {
            contrast: 1.0,
            sharpness: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_crop_face_uses_template_ratios() {
        let card = plain_card(200, 100);
        let face = crop_face(&card, &no_enhance()).unwrap();
        // [200*0.78, 100*0.30, 200*0.98, 100*0.85] -> 156..196 x 30..85
        assert_eq!(face.width(), 40);
        assert_eq!(face.height(), 55);
    }

    #[test]
    fn test_crop_face_degenerate_card_is_none() {
        let card = plain_card(1, 1);
        assert!(crop_face(&card, &no_enhance()).is_none());
    }

    #[test]
    fn test_crop_face_zero_area_region_is_none() {
        let config = FaceRegionConfig {
            left_ratio: 0.5,
            right_ratio: 0.5,
            ..no_enhance()
        };
        let card = plain_card(100, 100);
        assert!(crop_face(&card, &config).is_none());
    }

    #[test]
    fn test_crop_face_clamps_to_bounds() {
        let config = FaceRegionConfig {
            left_ratio: 0.9,
            top_ratio: 0.9,
            right_ratio: 1.0,
            bottom_ratio: 1.0,
            ..no_enhance()
        };
        let card = plain_card(50, 50);
        let face = crop_face(&card, &config).unwrap();
        assert_eq!(face.width(), 5);
        assert_eq!(face.height(), 5);
    }

    #[test]
    fn test_crop_face_jpeg_is_decodable() {
        let card = plain_card(200, 100);
        let bytes = crop_face_jpeg(&card, &FaceRegionConfig::default()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 40);
        assert_eq!(decoded.height(), 55);
    }
}
