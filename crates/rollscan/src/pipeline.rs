//! End-to-end extraction pipeline.
//!
//! One invocation takes scanned sheet images through segmentation, face
//! cropping, parallel OCR, field parsing, and report materialization. Only
//! unrecoverable input errors (undecodable sheet, empty batch) abort a
//! run; per-card and per-field failures degrade to defaults and are
//! logged.

use crate::artifacts::RunDir;
use crate::config::PipelineConfig;
use crate::error::{Result, RollscanError};
use crate::face::crop_face_jpeg;
use crate::ocr::{OcrDispatcher, TextRecognizer};
use crate::parse::parse_card;
use crate::report::{REPORT_HEADERS, ReportSink, XlsxReportSink, record_row};
use crate::segment::split_sheet;
use crate::types::CardRecord;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Grace period between report delivery and run-directory removal.
const RUN_DIR_CLEANUP_DELAY: Duration = Duration::from_millis(500);

/// One card after OCR and parsing, ready for the report.
#[derive(Debug, Clone)]
pub struct ExtractedCard {
    pub record: CardRecord,
    /// JPEG buffer of the photograph region, when the crop succeeded.
    pub thumbnail: Option<Vec<u8>>,
    /// Raw recognized text, kept for operator review of degraded rows.
    pub text: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub run_id: String,
    /// Data rows written to the report.
    pub rows: usize,
    /// Cards whose recognition produced no text.
    pub empty_cards: usize,
    pub output: PathBuf,
}

/// Coordinates the extraction stages for one or more sheets.
pub struct Pipeline<R> {
    config: PipelineConfig,
    recognizer: Arc<R>,
}

impl<R: TextRecognizer + 'static> Pipeline<R> {
    pub fn new(config: PipelineConfig, recognizer: Arc<R>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            recognizer,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract every card of one sheet image.
    ///
    /// Cards come back in row-major grid order. Recognition failures
    /// yield cards with default fields, never an error.
    pub async fn extract_sheet(&self, bytes: &[u8]) -> Result<Vec<ExtractedCard>> {
        let batch = split_sheet(bytes, &self.config.grid, &self.config.margins)?;
        // The segmenter never fails on degenerate cell sizes; dimension
        // validation is this caller's job.
        if batch.iter().any(|card| card.width() == 0 || card.height() == 0) {
            return Err(RollscanError::validation(format!(
                "sheet is smaller than the {}x{} card grid",
                self.config.grid.cols, self.config.grid.rows
            )));
        }

        let thumbnails: Vec<Option<Vec<u8>>> = batch
            .iter()
            .map(|card| crop_face_jpeg(card, &self.config.face))
            .collect();

        let dispatcher = OcrDispatcher::new(
            Arc::clone(&self.recognizer),
            self.config.preprocess,
            self.config.ocr_concurrency(),
        );
        let outcomes = dispatcher.recognize_batch(batch).await?;

        let cards = outcomes
            .into_iter()
            .zip(thumbnails)
            .map(|(outcome, thumbnail)| {
                if outcome.is_empty() {
                    tracing::warn!(index = outcome.index, "card yielded no text, row will hold defaults");
                }
                ExtractedCard {
                    record: parse_card(&outcome.text),
                    thumbnail,
                    text: outcome.text,
                }
            })
            .collect();
        Ok(cards)
    }

    /// Extract every card of a sheet file on disk.
    pub async fn extract_sheet_file(&self, path: impl AsRef<Path>) -> Result<Vec<ExtractedCard>> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        self.extract_sheet(&bytes).await
    }

    /// Process the given sheets and materialize one `.xlsx` report.
    ///
    /// Cards keep sheet order first, then row-major order within each
    /// sheet. Face crops are staged in a run directory for operator
    /// review and removed shortly after the report is saved.
    pub async fn run(&self, inputs: &[PathBuf], output: &Path) -> Result<RunSummary> {
        if inputs.is_empty() {
            return Err(RollscanError::validation("no input sheets given"));
        }

        let run_dir = RunDir::create(std::env::temp_dir()).await?;
        let run_id = run_dir.id().to_string();
        tracing::info!(run_id = %run_id, sheets = inputs.len(), "starting extraction run");

        let mut cards = Vec::new();
        for input in inputs {
            tracing::info!(sheet = %input.display(), "processing sheet");
            cards.extend(self.extract_sheet_file(input).await?);
        }

        for (index, card) in cards.iter().enumerate() {
            if let Some(thumbnail) = &card.thumbnail
                && let Err(e) = run_dir
                    .write_artifact(&format!("face_{index}.jpg"), thumbnail)
                    .await
            {
                tracing::warn!(index, error = %e, "failed to stage face crop");
            }
        }

        let mut sink = XlsxReportSink::new(self.config.report.clone());
        let rows = self.write_report(&cards, &mut sink, output)?;
        let empty_cards = cards.iter().filter(|c| c.text.trim().is_empty()).count();

        run_dir.cleanup_after(RUN_DIR_CLEANUP_DELAY);
        tracing::info!(run_id = %run_id, rows, empty_cards, output = %output.display(), "run complete");

        Ok(RunSummary {
            run_id,
            rows,
            empty_cards,
            output: output.to_path_buf(),
        })
    }

    /// Write extracted cards through a report sink.
    pub fn write_report(
        &self,
        cards: &[ExtractedCard],
        sink: &mut dyn ReportSink,
        path: &Path,
    ) -> Result<usize> {
        sink.begin(&REPORT_HEADERS)?;
        let start_serial = self.config.report.start_serial;
        for (index, card) in cards.iter().enumerate() {
            let values = record_row(index + 1, start_serial + index as i64, &card.record);
            sink.write_row(index, &values, card.thumbnail.as_deref())?;
        }
        sink.save(path)?;
        Ok(cards.len())
    }
}
