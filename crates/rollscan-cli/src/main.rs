//! Command-line front end for the rollscan extraction pipeline.

use anyhow::{Context, bail};
use clap::Parser;
use rollscan::{Pipeline, PipelineConfig, TesseractRecognizer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Extract voter records from scanned card sheets into a spreadsheet.
#[derive(Debug, Parser)]
#[command(name = "rollscan", version, about)]
struct Cli {
    /// Sheet image files, or a directory of sheet images.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output spreadsheet path.
    #[arg(short, long, default_value = "voters.xlsx")]
    output: PathBuf,

    /// Configuration file (default: discover rollscan.toml upwards).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid columns per sheet.
    #[arg(long)]
    cols: Option<u32>,

    /// Grid rows per sheet.
    #[arg(long)]
    rows: Option<u32>,

    /// Tesseract language set, e.g. "mar+eng".
    #[arg(long)]
    lang: Option<String>,

    /// Tesseract page segmentation mode.
    #[arg(long)]
    psm: Option<u8>,

    /// First value of the running serial column.
    #[arg(long)]
    start_serial: Option<i64>,

    /// Maximum concurrent OCR tasks (default: CPU count).
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Skip the tesseract installation check.
    #[arg(long)]
    no_check: bool,

    /// Print the run summary as JSON instead of plain text.
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => {
                let cwd = std::env::current_dir()?;
                PipelineConfig::discover(&cwd)?.unwrap_or_default()
            }
        };

        if let Some(cols) = self.cols {
            config.grid.cols = cols;
        }
        if let Some(rows) = self.rows {
            config.grid.rows = rows;
        }
        if let Some(lang) = &self.lang {
            config.tesseract.languages = lang.clone();
        }
        if let Some(psm) = self.psm {
            config.tesseract.psm = psm;
        }
        if let Some(serial) = self.start_serial {
            config.report.start_serial = serial;
        }
        if let Some(max) = self.max_concurrent {
            config.max_concurrent_ocr = Some(max);
        }
        Ok(config)
    }

    /// Expand directory inputs into their contained image files.
    fn sheet_paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut sheets = Vec::new();
        for input in &self.inputs {
            if input.is_dir() {
                let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                    .with_context(|| format!("failed to read {}", input.display()))?
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| is_image_file(p))
                    .collect();
                entries.sort();
                if entries.is_empty() {
                    bail!("no sheet images found in {}", input.display());
                }
                sheets.extend(entries);
            } else {
                sheets.push(input.clone());
            }
        }
        Ok(sheets)
    }
}

fn is_image_file(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("png" | "jpg" | "jpeg" | "webp" | "tif" | "tiff" | "bmp")
    )
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rollscan={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.load_config()?;
    let sheets = cli.sheet_paths()?;

    let recognizer = TesseractRecognizer::new(config.tesseract.clone());
    if !cli.no_check {
        let version = recognizer
            .check_installation()
            .await
            .context("tesseract is required; install it or pass --no-check to skip this probe")?;
        tracing::info!(%version, "tesseract found");
        recognizer.check_languages()?;
    }

    let pipeline = Pipeline::new(config, Arc::new(recognizer))?;
    let summary = pipeline.run(&sheets, &cli.output).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Wrote {} rows to {} ({} cards without text)",
            summary.rows,
            summary.output.display(),
            summary.empty_cards
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "rollscan",
            "sheet.png",
            "-o",
            "out.xlsx",
            "--cols",
            "4",
            "--rows",
            "8",
            "--lang",
            "hin+eng",
            "--start-serial",
            "1",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.grid.cols, 4);
        assert_eq!(config.grid.rows, 8);
        assert_eq!(config.tesseract.languages, "hin+eng");
        assert_eq!(config.report.start_serial, 1);
        assert_eq!(cli.output, PathBuf::from("out.xlsx"));
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["rollscan"]).is_err());
    }

    #[test]
    fn test_directory_input_expands_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let cli = Cli::parse_from(["rollscan", dir.path().to_str().unwrap()]);
        let sheets = cli.sheet_paths().unwrap();
        assert_eq!(sheets.len(), 2);
        assert!(sheets[0].ends_with("a.jpg"));
        assert!(sheets[1].ends_with("b.png"));
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["rollscan", dir.path().to_str().unwrap()]);
        assert!(cli.sheet_paths().is_err());
    }
}
