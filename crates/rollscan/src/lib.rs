//! Rollscan - Voter Card Sheet Extraction Library
//!
//! Rollscan turns scanned voter-list sheets (a fixed grid of identity
//! cards per page) into a structured spreadsheet: one row per card with
//! the voter's identifier, name, guardian, house number, age, gender, and
//! an embedded photo thumbnail.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rollscan::{Pipeline, PipelineConfig, TesseractRecognizer};
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//!
//! # async fn run() -> rollscan::Result<()> {
//! let config = PipelineConfig::default();
//! let recognizer = Arc::new(TesseractRecognizer::new(config.tesseract.clone()));
//! let pipeline = Pipeline::new(config, recognizer)?;
//! let summary = pipeline
//!     .run(&[PathBuf::from("voters.jpg")], Path::new("voters.xlsx"))
//!     .await?;
//! println!("wrote {} rows", summary.rows);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Segmentation** (`segment`): grid split of a sheet into card images
//! - **Face cropping** (`face`): fixed-position photo region extraction
//! - **OCR** (`ocr`): Tesseract subprocess backend behind a recognizer
//!   trait, dispatched over a bounded worker pool
//! - **Parsing** (`parse`): regex cascade turning recognized text into
//!   structured records
//! - **Reporting** (`report`): `.xlsx` materialization with embedded
//!   thumbnails

#![deny(unsafe_code)]

pub mod artifacts;
pub mod config;
pub mod error;
pub mod face;
pub mod ocr;
pub mod parse;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod segment;
pub mod types;

pub use config::{
    FaceRegionConfig, GridConfig, PageMarginConfig, PipelineConfig, PreprocessConfig,
    ReportConfig, TesseractConfig,
};
pub use error::{Result, RollscanError};
pub use ocr::{OcrDispatcher, TesseractRecognizer, TextRecognizer};
pub use parse::parse_card;
pub use pipeline::{ExtractedCard, Pipeline, RunSummary};
pub use report::{REPORT_HEADERS, ReportSink, ReportValue, XlsxReportSink};
pub use types::{CardImage, CardRecord, OcrOutcome, RelationLabel, RunBatch};
