//! Report materialization.
//!
//! Parsed records are written through the [`ReportSink`] trait, one row
//! per card in batch order, with an optional embedded photo thumbnail per
//! row. The production sink produces an `.xlsx` workbook; tests substitute
//! recording sinks. A failed thumbnail embed is logged and the row
//! proceeds without an image.

use crate::config::ReportConfig;
use crate::error::Result;
use crate::types::CardRecord;
use rust_xlsxwriter::{Format, Image, Workbook};
use std::path::Path;

/// Header row of the voter report, in column order.
pub const REPORT_HEADERS: [&str; 10] = [
    "S.No.",
    "ID",
    "RegNo",
    "Serial",
    "मतदाराचे पूर्ण:",
    "पतीचे नाव / वडिलांचे नाव",
    "घर क्रमांक :",
    "वय :",
    "लिंग :",
    "Face image",
];

/// Zero-based index of the photo column.
pub const PHOTO_COLUMN: usize = REPORT_HEADERS.len() - 1;

/// One cell value of a report row.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Text(String),
    Number(i64),
}

impl ReportValue {
    /// Stringified form used for column auto-sizing.
    pub fn display_len(&self) -> usize {
        match self {
            ReportValue::Text(s) => s.chars().count(),
            ReportValue::Number(n) => n.to_string().len(),
        }
    }
}

/// Build the data cells of one report row.
///
/// `sequence` is the 1-based position within the batch; `serial` is the
/// running electoral serial number.
pub fn record_row(sequence: usize, serial: i64, record: &CardRecord) -> Vec<ReportValue> {
    vec![
        ReportValue::Number(sequence as i64),
        ReportValue::Text(record.id.clone()),
        ReportValue::Text(record.reg_no.clone()),
        ReportValue::Number(serial),
        ReportValue::Text(record.voter_name.clone()),
        ReportValue::Text(record.relation_name.clone()),
        ReportValue::Text(record.house.clone()),
        ReportValue::Text(record.age.clone()),
        ReportValue::Text(record.gender_full.clone()),
    ]
}

/// Tabular document writer with image-embedding support.
pub trait ReportSink {
    /// Start a new report with the given header row.
    fn begin(&mut self, headers: &[&str]) -> Result<()>;

    /// Write one data row; `row_index` is zero-based over data rows.
    ///
    /// A thumbnail that fails to embed must not fail the row.
    fn write_row(
        &mut self,
        row_index: usize,
        values: &[ReportValue],
        thumbnail: Option<&[u8]>,
    ) -> Result<()>;

    /// Finalize and persist the report.
    fn save(&mut self, path: &Path) -> Result<()>;
}

/// Sink producing an `.xlsx` workbook.
pub struct XlsxReportSink {
    config: ReportConfig,
    workbook: Workbook,
    header_format: Format,
    cell_format: Format,
    /// Longest stringified value seen per column, for auto-sizing.
    column_chars: Vec<usize>,
}

impl XlsxReportSink {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            workbook: Workbook::new(),
            header_format: Format::new().set_bold(),
            cell_format: Format::new(),
            column_chars: Vec::new(),
        }
    }

    fn embed_thumbnail(&mut self, row: u32, bytes: &[u8]) -> Result<()> {
        let mut image = Image::new_from_buffer(bytes)?;
        let width = image.width();
        let height = image.height();
        if width > 0.0 && height > 0.0 {
            image = image
                .set_scale_width(self.config.thumb_width as f64 / width)
                .set_scale_height(self.config.thumb_height as f64 / height);
        }
        let worksheet = self.workbook.worksheet_from_index(0)?;
        worksheet.insert_image(row, PHOTO_COLUMN as u16, &image)?;
        worksheet.set_row_height(row, self.config.thumb_row_height())?;
        Ok(())
    }
}

impl ReportSink for XlsxReportSink {
    fn begin(&mut self, headers: &[&str]) -> Result<()> {
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&self.config.sheet_name)?;
        self.column_chars = headers.iter().map(|h| h.chars().count()).collect();
        for (col, header) in headers.iter().enumerate() {
            worksheet.write_with_format(0, col as u16, *header, &self.header_format)?;
        }
        Ok(())
    }

    fn write_row(
        &mut self,
        row_index: usize,
        values: &[ReportValue],
        thumbnail: Option<&[u8]>,
    ) -> Result<()> {
        let row = (row_index + 1) as u32;
        {
            let cell_format = self.cell_format.clone();
            let worksheet = self.workbook.worksheet_from_index(0)?;
            for (col, value) in values.iter().enumerate() {
                match value {
                    ReportValue::Text(text) => {
                        worksheet.write_with_format(row, col as u16, text.as_str(), &cell_format)?
                    }
                    ReportValue::Number(n) => {
                        worksheet.write_with_format(row, col as u16, *n as f64, &cell_format)?
                    }
                };
            }
        }
        for (col, value) in values.iter().enumerate() {
            if col < self.column_chars.len() {
                self.column_chars[col] = self.column_chars[col].max(value.display_len());
            }
        }

        if let Some(bytes) = thumbnail
            && let Err(e) = self.embed_thumbnail(row, bytes)
        {
            tracing::warn!(row = row_index, error = %e, "thumbnail embed failed, row continues without image");
        }
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let max_width = self.config.max_column_width;
        let photo_width = self.config.photo_column_width();
        let widths: Vec<(u16, f64)> = self
            .column_chars
            .iter()
            .enumerate()
            .map(|(col, chars)| {
                let width = if col == PHOTO_COLUMN {
                    photo_width
                } else {
                    (*chars as f64 + 2.0).min(max_width)
                };
                (col as u16, width)
            })
            .collect();

        let worksheet = self.workbook.worksheet_from_index(0)?;
        for (col, width) in widths {
            worksheet.set_column_width(col, width)?;
        }
        self.workbook.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FaceRegionConfig;
    use crate::face::crop_face_jpeg;
    use crate::types::CardImage;
    use image::DynamicImage;

    fn sample_record() -> CardRecord {
        CardRecord {
            id: "XYZ1234567 25/2/2024".to_string(),
            reg_no: "25/210/9".to_string(),
            voter_name: "सुनीता रमेश पाटील".to_string(),
            relation_name: "रमेश पाटील".to_string(),
            house: "55".to_string(),
            age: "45".to_string(),
            ..CardRecord::default()
        }
    }

    fn sample_thumbnail() -> Vec<u8> {
        let card = CardImage::new(DynamicImage::new_rgb8(200, 100));
        crop_face_jpeg(&card, &FaceRegionConfig::default()).unwrap()
    }

    #[test]
    fn test_record_row_column_order() {
        let row = record_row(1, 9, &sample_record());
        assert_eq!(row.len(), REPORT_HEADERS.len() - 1);
        assert_eq!(row[0], ReportValue::Number(1));
        assert_eq!(row[1], ReportValue::Text("XYZ1234567 25/2/2024".to_string()));
        assert_eq!(row[2], ReportValue::Text("25/210/9".to_string()));
        assert_eq!(row[3], ReportValue::Number(9));
        assert_eq!(row[4], ReportValue::Text("सुनीता रमेश पाटील".to_string()));
        assert_eq!(row[8], ReportValue::Text("पुरुष".to_string()));
    }

    #[test]
    fn test_display_len_counts_chars_not_bytes() {
        let value = ReportValue::Text("सुनीता".to_string());
        assert_eq!(value.display_len(), 6);
    }

    #[test]
    fn test_xlsx_sink_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voters.xlsx");

        let mut sink = XlsxReportSink::new(ReportConfig::default());
        sink.begin(&REPORT_HEADERS).unwrap();
        for i in 0..3 {
            let row = record_row(i + 1, 9 + i as i64, &sample_record());
            sink.write_row(i, &row, Some(&sample_thumbnail())).unwrap();
        }
        sink.save(&path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_bad_thumbnail_does_not_fail_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voters.xlsx");

        let mut sink = XlsxReportSink::new(ReportConfig::default());
        sink.begin(&REPORT_HEADERS).unwrap();
        let row = record_row(1, 9, &sample_record());
        sink.write_row(0, &row, Some(b"not an image")).unwrap();
        sink.save(&path).unwrap();
    }

    #[test]
    fn test_rows_without_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voters.xlsx");

        let mut sink = XlsxReportSink::new(ReportConfig::default());
        sink.begin(&REPORT_HEADERS).unwrap();
        let row = record_row(1, 9, &sample_record());
        sink.write_row(0, &row, None).unwrap();
        sink.save(&path).unwrap();
    }
}
