// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasteriser — render one PDF page to an in-memory RGB raster sized to
// the page's media box at a given scale.
//
// Scanned pages are reproduced from their embedded image. Vector content
// (glyphs, paths) is not drawn here; builds with the `pdfium` feature render
// full pages with `PdfiumRasterizer` and keep this path as the fallback.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use folio_core::error::{FolioError, Result};
use tracing::{debug, info, instrument};

use super::reader::PdfReader;
use crate::page::PageImage;

/// Scale used for recognition input: 1.5x the page's natural size.
pub const DEFAULT_RENDER_SCALE: f32 = 1.5;

/// Largest edge we are willing to allocate, in pixels.
const MAX_RENDER_EDGE: u32 = 16_384;

/// Renders PDF pages to rasters.
pub struct PageRasterizer;

impl PageRasterizer {
    /// Open `data` and render the 1-indexed `page_number` at `scale`.
    #[instrument(skip(data), fields(bytes_len = data.len()))]
    pub fn render(data: &[u8], page_number: u32, scale: f32) -> Result<PageImage> {
        let reader = PdfReader::from_bytes(data)?;
        Self::render_page(&reader, page_number, scale)
    }

    /// Render a page of an already opened document.
    ///
    /// Output dimensions are `round(width * scale)` x `round(height * scale)`
    /// of the media box, swapped when the page is displayed at 90 or 270
    /// degrees.
    pub fn render_page(reader: &PdfReader, page_number: u32, scale: f32) -> Result<PageImage> {
        check_scale(scale)?;

        let (page_w, page_h) = reader.page_size(page_number)?;
        let rotation = reader.page_rotation(page_number)?;
        let width = scaled_edge(page_w, scale)?;
        let height = scaled_edge(page_h, scale)?;

        info!(page_number, width, height, rotation, "Rendering page");

        let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        if let Some(scan) = reader.page_image(page_number)? {
            let fitted = scan.resize(width, height, FilterType::Triangle).to_rgb8();
            let x = (width - fitted.width()) / 2;
            let y = (height - fitted.height()) / 2;
            imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
        } else {
            debug!(page_number, "No embedded image; page rendered blank");
        }

        let canvas = DynamicImage::ImageRgb8(canvas);
        let rendered = match rotation {
            90 => canvas.rotate90(),
            180 => canvas.rotate180(),
            270 => canvas.rotate270(),
            _ => canvas,
        };

        Ok(PageImage::new(rendered, page_number, scale))
    }
}

pub(crate) fn check_scale(scale: f32) -> Result<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(FolioError::Render(format!(
            "render scale must be positive, got {}",
            scale
        )));
    }
    Ok(())
}

pub(crate) fn scaled_edge(points: f32, scale: f32) -> Result<u32> {
    let pixels = (points * scale).round().max(1.0);
    if pixels > MAX_RENDER_EDGE as f32 {
        return Err(FolioError::Render(format!(
            "rendered page edge of {} px exceeds the {} px limit",
            pixels, MAX_RENDER_EDGE
        )));
    }
    Ok(pixels as u32)
}
