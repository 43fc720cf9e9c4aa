//! Tesseract subprocess backend.
//!
//! Recognition shells out to the `tesseract` binary with the card image in
//! a temporary PNG file and text collected from stdout. The subprocess is
//! wrapped in a timeout so a wedged recognizer cannot stall the whole
//! batch.

use crate::config::TesseractConfig;
use crate::error::{Result, RollscanError};
use crate::ocr::TextRecognizer;
use async_trait::async_trait;
use image::DynamicImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// OCR backend invoking the Tesseract CLI.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: TesseractConfig,
}

impl TesseractRecognizer {
    pub fn new(config: TesseractConfig) -> Self {
        Self { config }
    }

    /// Verify the binary is on PATH and report its version string.
    pub async fn check_installation(&self) -> Result<String> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                RollscanError::ocr_with_source(
                    format!("tesseract binary '{}' not found", self.config.binary),
                    e,
                )
            })?;

        // Tesseract historically prints its version banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        let first_line = String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string();
        Ok(first_line)
    }

    /// Validate that every requested language has a traineddata file.
    ///
    /// Only possible when a tessdata directory is configured; without one
    /// the check is skipped and Tesseract reports missing languages itself.
    pub fn check_languages(&self) -> Result<()> {
        let Some(dir) = &self.config.tessdata_dir else {
            return Ok(());
        };
        for lang in self.config.languages.split('+') {
            let traineddata = dir.join(format!("{lang}.traineddata"));
            if !traineddata.is_file() {
                return Err(RollscanError::ocr(format!(
                    "missing traineddata for language '{}' in {}",
                    lang,
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    async fn run_tesseract(&self, input: &Path) -> Result<String> {
        let mut command = Command::new(&self.config.binary);
        command
            .arg(input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.languages)
            .arg("--psm")
            .arg(self.config.psm.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.config.tessdata_dir {
            command.env("TESSDATA_PREFIX", dir);
        }

        let output = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_secs),
            command.output(),
        )
        .await
        .map_err(|_| {
            RollscanError::ocr(format!(
                "tesseract timed out after {}s",
                self.config.timeout_secs
            ))
        })?
        .map_err(|e| RollscanError::ocr_with_source("failed to spawn tesseract", e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RollscanError::ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| {
                RollscanError::invalid_image_with_source("failed to encode card for ocr", e)
            })?;

        let temp = TempInput::create(&png).await?;
        self.run_tesseract(temp.path()).await
    }
}

/// Temporary input file removed when the recognition finishes.
///
/// Cleanup is spawned on drop so the recognize path never blocks on
/// filesystem teardown.
struct TempInput {
    path: PathBuf,
}

impl TempInput {
    async fn create(bytes: &[u8]) -> Result<Self> {
        let path = std::env::temp_dir().join(format!("rollscan-{}.png", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, bytes).await?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempInput {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _ = tokio::fs::remove_file(&path).await;
            });
        } else {
            let _ = std::fs::remove_file(&path);
        }
    }
}
