//! Core data model: card images, OCR outcomes, and parsed records.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// One card cropped out of a scanned sheet.
///
/// Immutable once created; owned by exactly one pipeline stage at a time.
#[derive(Debug, Clone)]
pub struct CardImage {
    image: DynamicImage,
}

impl CardImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

impl From<DynamicImage> for CardImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// Ordered batch of cards for one sheet, in row-major scan order.
///
/// The order is established by the grid segmenter and must be preserved
/// end-to-end into the final report row order.
pub type RunBatch = Vec<CardImage>;

/// Result of recognizing one card, tagged with its submission index.
///
/// Recognition failure is degraded to an empty string; it is never fatal
/// to the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrOutcome {
    pub index: usize,
    pub text: String,
}

impl OcrOutcome {
    pub fn recognized(index: usize, text: String) -> Self {
        Self { index, text }
    }

    /// Outcome for a card whose recognition task failed.
    pub fn failed(index: usize) -> Self {
        Self {
            index,
            text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Which guardian label matched during relation-name extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationLabel {
    Husband,
    Father,
    #[default]
    None,
}

impl RelationLabel {
    /// The printed label that identified the relation, as it appears on
    /// the card template.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationLabel::Husband => "पतीचे नाव",
            RelationLabel::Father => "वडिलांचे नाव",
            RelationLabel::None => "",
        }
    }
}

/// Structured result of parsing one card's OCR text.
///
/// Every field holds its documented default when extraction misses; the
/// parser never fails on malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Card identifier, usually `<alnum id> <issue date>` from the first line.
    pub id: String,
    /// Registration number of the form `113/236/1277`, when present.
    pub reg_no: String,
    pub voter_name: String,
    pub relation_label: RelationLabel,
    pub relation_name: String,
    /// House number; `"NA"` when absent or explicitly marked so.
    pub house: String,
    /// Age in ASCII digits; empty when no age label was found.
    pub age: String,
    pub gender_code: String,
    pub gender_full: String,
}

impl Default for CardRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            reg_no: String::new(),
            voter_name: String::new(),
            relation_label: RelationLabel::None,
            relation_name: String::new(),
            house: "NA".to_string(),
            age: String::new(),
            gender_code: "पु".to_string(),
            gender_full: "पुरुष".to_string(),
        }
    }
}
