//! Configuration loading and management.
//!
//! All tunables of the pipeline live in [`PipelineConfig`], which can be
//! created programmatically or loaded from a `rollscan.toml` file. The
//! parser's keyword sets are deliberately not configurable; the template
//! constants here cover everything that legitimately varies between scans
//! (grid shape, crop ratios, recognizer invocation, report layout).

use crate::error::{Result, RollscanError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the discovered configuration file.
pub const CONFIG_FILE_NAME: &str = "rollscan.toml";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub grid: GridConfig,
    pub margins: PageMarginConfig,
    pub face: FaceRegionConfig,
    pub preprocess: PreprocessConfig,
    pub tesseract: TesseractConfig,
    pub report: ReportConfig,

    /// Maximum concurrent OCR tasks (None = available parallelism).
    pub max_concurrent_ocr: Option<usize>,
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = toml::from_str(&content).map_err(|e| {
            RollscanError::validation_with_source(
                format!("failed to parse {}", path.as_ref().display()),
                e,
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Look for `rollscan.toml` in the given directory and its ancestors.
    ///
    /// Returns `Ok(None)` when no configuration file exists.
    pub fn discover(start_dir: impl AsRef<Path>) -> Result<Option<Self>> {
        let mut dir = Some(start_dir.as_ref());
        while let Some(current) = dir {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Self::from_toml_file(&candidate).map(Some);
            }
            dir = current.parent();
        }
        Ok(None)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid.cols == 0 || self.grid.rows == 0 {
            return Err(RollscanError::validation(format!(
                "grid must have at least one column and one row, got {}x{}",
                self.grid.cols, self.grid.rows
            )));
        }
        if self.tesseract.languages.trim().is_empty() {
            return Err(RollscanError::validation(
                "tesseract language set cannot be empty",
            ));
        }
        self.face.validate()?;
        Ok(())
    }

    /// Effective OCR worker-pool size.
    pub fn ocr_concurrency(&self) -> usize {
        self.max_concurrent_ocr
            .unwrap_or_else(num_cpus::get)
            .max(1)
    }
}

/// Grid shape of the card sheet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub cols: u32,
    pub rows: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { cols: 3, rows: 10 }
    }
}

impl GridConfig {
    pub fn cells(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

/// Fixed pixel margins trimmed off the sheet before grid splitting.
///
/// Some scanners leave a header band and edge gutters around the card
/// grid; all zero disables the pre-crop.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageMarginConfig {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PageMarginConfig {
    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }
}

/// Proportional photograph region within a card.
///
/// The photo location is fixed by the card template, not detected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceRegionConfig {
    pub left_ratio: f32,
    pub top_ratio: f32,
    pub right_ratio: f32,
    pub bottom_ratio: f32,
    /// Contrast boost applied to the cropped photo.
    pub contrast: f32,
    /// Sharpness boost applied to the cropped photo.
    pub sharpness: f32,
    /// JPEG quality of the re-encoded thumbnail buffer.
    pub jpeg_quality: u8,
}

impl Default for FaceRegionConfig {
    fn default() -> Self {
        Self {
            left_ratio: 0.78,
            top_ratio: 0.30,
            right_ratio: 0.98,
            bottom_ratio: 0.85,
            contrast: 1.2,
            sharpness: 1.3,
            jpeg_quality: 90,
        }
    }
}

impl FaceRegionConfig {
    fn validate(&self) -> Result<()> {
        let ratios = [
            self.left_ratio,
            self.top_ratio,
            self.right_ratio,
            self.bottom_ratio,
        ];
        if ratios.iter().any(|r| !(0.0..=1.0).contains(r)) {
            return Err(RollscanError::validation(
                "face region ratios must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// OCR pre-processing tuned for the card template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Cards narrower than this are upscaled before recognition.
    pub min_width: u32,
    /// Upscale factor applied below `min_width`.
    pub upscale_factor: u32,
    /// Contrast multiplier (1.0 = unchanged).
    pub contrast: f32,
    /// Sharpness multiplier (1.0 = unchanged).
    pub sharpness: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            min_width: 400,
            upscale_factor: 2,
            contrast: 1.4,
            sharpness: 1.1,
        }
    }
}

/// Tesseract subprocess invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Binary name or absolute path.
    pub binary: String,
    /// `+`-joined language set, e.g. `"mar+eng"`.
    pub languages: String,
    /// Page segmentation mode; 6 = single uniform block, which suits the
    /// dense single-column card layout.
    pub psm: u8,
    /// Per-card recognition timeout.
    pub timeout_secs: u64,
    /// Override for the traineddata directory (sets TESSDATA_PREFIX).
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            languages: "mar+eng".to_string(),
            psm: 6,
            timeout_secs: 30,
            tessdata_dir: None,
        }
    }
}

/// Spreadsheet layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub sheet_name: String,
    /// First value of the running serial-number column.
    pub start_serial: i64,
    /// Embedded thumbnail size in pixels.
    pub thumb_width: u32,
    pub thumb_height: u32,
    /// Character-width cap for auto-sized columns.
    pub max_column_width: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Voters".to_string(),
            start_serial: 9,
            thumb_width: 80,
            thumb_height: 90,
            max_column_width: 60.0,
        }
    }
}

impl ReportConfig {
    /// Width of the photo column, wide enough to fit the thumbnail.
    pub fn photo_column_width(&self) -> f64 {
        (self.thumb_width as f64 * 0.14 + 2.0).max(18.0)
    }

    /// Row height in points matching the thumbnail height in pixels.
    pub fn thumb_row_height(&self) -> f64 {
        self.thumb_height as f64 * 0.75
    }
}
