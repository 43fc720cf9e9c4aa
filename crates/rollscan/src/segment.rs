//! Grid segmentation of a scanned sheet into individual card images.
//!
//! The sheet is divided into `cols x rows` cells using integer pixel
//! division. The last column/row absorbs no remainder correction: any
//! slack of `width % cols` / `height % rows` pixels is silently dropped,
//! not distributed. Output order is row-major.

use crate::config::{GridConfig, PageMarginConfig};
use crate::error::{Result, RollscanError};
use crate::types::{CardImage, RunBatch};
use image::DynamicImage;

/// Decode a sheet and split it into card images in row-major order.
///
/// Fails with `InvalidImage` when the bytes cannot be decoded. Degenerate
/// cell sizes (sheet smaller than the grid) do not fail here; callers
/// validate dimensions upstream when they care.
pub fn split_sheet(bytes: &[u8], grid: &GridConfig, margins: &PageMarginConfig) -> Result<RunBatch> {
    let sheet = image::load_from_memory(bytes)
        .map_err(|e| RollscanError::invalid_image_with_source("failed to decode sheet", e))?;
    let sheet = trim_margins(sheet, margins);
    Ok(split_image(&sheet, grid))
}

/// Split an already-decoded sheet into exactly `cols * rows` cards.
pub fn split_image(sheet: &DynamicImage, grid: &GridConfig) -> RunBatch {
    let (width, height) = (sheet.width(), sheet.height());
    let cell_width = width / grid.cols;
    let cell_height = height / grid.rows;

    tracing::debug!(
        width,
        height,
        cols = grid.cols,
        rows = grid.rows,
        cell_width,
        cell_height,
        "splitting sheet"
    );

    let mut cards = Vec::with_capacity(grid.cells());
    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let cell = sheet.crop_imm(col * cell_width, row * cell_height, cell_width, cell_height);
            cards.push(CardImage::new(cell));
        }
    }
    cards
}

/// Trim fixed pixel margins off the sheet before splitting.
///
/// Margins that do not leave a positive area are ignored rather than
/// producing an empty sheet.
fn trim_margins(sheet: DynamicImage, margins: &PageMarginConfig) -> DynamicImage {
    if margins.is_zero() {
        return sheet;
    }
    let (width, height) = (sheet.width(), sheet.height());
    if margins.left + margins.right >= width || margins.top + margins.bottom >= height {
        tracing::warn!(
            width,
            height,
            ?margins,
            "page margins exceed sheet dimensions, skipping pre-crop"
        );
        return sheet;
    }
    sheet.crop_imm(
        margins.left,
        margins.top,
        width - margins.left - margins.right,
        height - margins.top - margins.bottom,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};

    /// Sheet whose pixel value encodes its grid cell, so crops can be
    /// checked byte-for-byte.
    fn indexed_sheet(width: u32, height: u32, cols: u32, rows: u32) -> DynamicImage {
        let cw = width / cols;
        let rh = height / rows;
        let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
            let col = (x / cw.max(1)).min(cols - 1) as u8;
            let row = (y / rh.max(1)).min(rows - 1) as u8;
            Rgb([row * cols as u8 + col, 0, 0])
        });
        DynamicImage::ImageRgb8(img)
    }

    fn encode_png(image: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_split_produces_row_major_grid() {
        let grid = GridConfig { cols: 3, rows: 10 };
        let sheet = indexed_sheet(300, 1000, 3, 10);
        let cards = split_image(&sheet, &grid);

        assert_eq!(cards.len(), 30);
        for (i, card) in cards.iter().enumerate() {
            assert_eq!(card.width(), 100);
            assert_eq!(card.height(), 100);
            // Row-major order: cell i carries pixel value i.
            let pixel = card.as_image().to_rgb8().get_pixel(0, 0)[0];
            assert_eq!(pixel as usize, i);
        }
    }

    #[test]
    fn test_split_matches_manual_integer_division_crop() {
        let grid = GridConfig { cols: 3, rows: 4 };
        let sheet = indexed_sheet(310, 410, 3, 4);
        let cards = split_image(&sheet, &grid);

        let cw = 310 / 3;
        let rh = 410 / 4;
        for row in 0..4u32 {
            for col in 0..3u32 {
                let expected = sheet.crop_imm(col * cw, row * rh, cw, rh);
                let card = &cards[(row * 3 + col) as usize];
                assert_eq!(card.width(), cw);
                assert_eq!(card.height(), rh);
                assert_eq!(
                    card.as_image().to_rgb8().as_raw(),
                    expected.to_rgb8().as_raw()
                );
            }
        }
    }

    #[test]
    fn test_split_drops_remainder_pixels() {
        let grid = GridConfig { cols: 3, rows: 2 };
        // 11 % 3 = 2 slack columns, 7 % 2 = 1 slack row.
        let sheet = DynamicImage::new_rgb8(11, 7);
        let cards = split_image(&sheet, &grid);
        assert_eq!(cards.len(), 6);
        assert!(cards.iter().all(|c| c.width() == 3 && c.height() == 3));
    }

    #[test]
    fn test_split_degenerate_cells_do_not_fail() {
        let grid = GridConfig { cols: 3, rows: 10 };
        let sheet = DynamicImage::new_rgb8(2, 5);
        let cards = split_image(&sheet, &grid);
        assert_eq!(cards.len(), 30);
        assert!(cards.iter().all(|c| c.width() == 0));
    }

    #[test]
    fn test_split_sheet_invalid_bytes() {
        let grid = GridConfig::default();
        let err = split_sheet(&[0u8, 1, 2, 3], &grid, &PageMarginConfig::default()).unwrap_err();
        assert!(matches!(err, RollscanError::InvalidImage { .. }));
    }

    #[test]
    fn test_split_sheet_with_margins() {
        let grid = GridConfig { cols: 2, rows: 2 };
        let margins = PageMarginConfig {
            left: 10,
            top: 20,
            right: 10,
            bottom: 20,
        };
        let sheet = indexed_sheet(220, 240, 2, 2);
        let bytes = encode_png(&sheet);
        let cards = split_sheet(&bytes, &grid, &margins).unwrap();
        assert_eq!(cards.len(), 4);
        assert!(cards.iter().all(|c| c.width() == 100 && c.height() == 100));
    }

    #[test]
    fn test_oversized_margins_are_ignored() {
        let grid = GridConfig { cols: 1, rows: 1 };
        let margins = PageMarginConfig {
            left: 500,
            top: 0,
            right: 500,
            bottom: 0,
        };
        let sheet = indexed_sheet(100, 100, 1, 1);
        let bytes = encode_png(&sheet);
        let cards = split_sheet(&bytes, &grid, &margins).unwrap();
        assert_eq!(cards[0].width(), 100);
        assert_eq!(cards[0].height(), 100);
    }
}
