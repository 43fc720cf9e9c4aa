//! Error types for rollscan.
//!
//! All fallible operations in the library return [`Result`]. The error
//! policy mirrors the pipeline's degradation model:
//!
//! - **System errors bubble up unchanged:** `RollscanError::Io` indicates a
//!   real filesystem or process problem and must surface to the caller.
//! - **Unrecoverable input errors abort the run:** an undecodable source
//!   sheet or an empty batch is `InvalidImage` / `Validation`.
//! - **Per-unit failures never reach the caller:** OCR failures, parse
//!   misses, and thumbnail embed failures are absorbed where they occur and
//!   logged, so one bad card cannot fail the batch.
use thiserror::Error;

/// Result type alias using [`RollscanError`].
pub type Result<T> = std::result::Result<T, RollscanError>;

/// Main error type for all rollscan operations.
#[derive(Debug, Error)]
pub enum RollscanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image: {message}")]
    InvalidImage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Report error: {message}")]
    Report {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{0}")]
    Other(String),
}

macro_rules! error_constructor {
    ($name:ident, $with_source:ident, $variant:ident) => {
        #[doc = concat!("Create a `", stringify!($variant), "` error.")]
        pub fn $name<S: Into<String>>(message: S) -> Self {
            Self::$variant {
                message: message.into(),
                source: None,
            }
        }

        #[doc = concat!("Create a `", stringify!($variant), "` error with a source.")]
        pub fn $with_source<S, E>(message: S, source: E) -> Self
        where
            S: Into<String>,
            E: std::error::Error + Send + Sync + 'static,
        {
            Self::$variant {
                message: message.into(),
                source: Some(Box::new(source)),
            }
        }
    };
}

impl RollscanError {
    error_constructor!(invalid_image, invalid_image_with_source, InvalidImage);
    error_constructor!(ocr, ocr_with_source, Ocr);
    error_constructor!(report, report_with_source, Report);
    error_constructor!(validation, validation_with_source, Validation);
}

impl From<image::ImageError> for RollscanError {
    fn from(err: image::ImageError) -> Self {
        RollscanError::InvalidImage {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for RollscanError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        RollscanError::Report {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
