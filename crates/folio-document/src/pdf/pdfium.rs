// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Full page rendering through Google PDFium.
//
// Unlike the embedded-scan rasteriser this draws glyphs, paths, and forms, so
// pages whose text layer is missing or unusable (outlined text, fonts without
// a ToUnicode map) still reach recognition with their content visible.
//
// `Pdfium` is `!Send`, so a fresh instance is bound for every call; the
// dynamic loader caches the library itself.

use std::path::PathBuf;

use folio_core::error::{FolioError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;
use tracing::{debug, instrument};

use super::rasterizer::{check_scale, scaled_edge};
use crate::page::PageImage;

/// Overrides library discovery with an explicit path to the PDFium library.
const LIBRARY_PATH_ENV: &str = "PDFIUM_DYNAMIC_LIB_PATH";

/// Renders PDF pages with PDFium.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    /// Fails with [`FolioError::EngineUnavailable`] when no PDFium library
    /// can be loaded.
    pub fn new() -> Result<Self> {
        let _ = load_pdfium()?;
        Ok(Self)
    }

    /// Render the 1-indexed `page_number` of `data` at `scale`.
    ///
    /// Output dimensions follow the displayed page box, rotation included:
    /// `round(width * scale)` x `round(height * scale)`.
    #[instrument(skip(self, data), fields(bytes_len = data.len()))]
    pub fn render(&self, data: &[u8], page_number: u32, scale: f32) -> Result<PageImage> {
        check_scale(scale)?;

        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|err| FolioError::PdfError(format!("PDFium could not open the PDF: {err}")))?;

        let pages = document.pages();
        let total = pages.len() as u32;
        if page_number == 0 || page_number > total {
            return Err(FolioError::InvalidPage {
                page: page_number,
                total,
            });
        }
        let index = u16::try_from(page_number - 1).map_err(|_| {
            FolioError::Render(format!("page {page_number} is beyond PDFium's page index"))
        })?;
        let page = pages
            .get(index)
            .map_err(|err| FolioError::Render(format!("PDFium could not load page {page_number}: {err}")))?;

        let width = scaled_edge(page.width().value, scale)?;
        let height = scaled_edge(page.height().value, scale)?;

        let config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|err| FolioError::Render(format!("PDFium failed on page {page_number}: {err}")))?;

        let raster = RgbaImage::from_raw(
            bitmap.width() as u32,
            bitmap.height() as u32,
            bitmap.as_rgba_bytes(),
        )
        .ok_or_else(|| FolioError::Render(format!("PDFium bitmap for page {page_number} is truncated")))?;

        let mut rendered = DynamicImage::ImageRgba8(raster);
        if rendered.width() != width || rendered.height() != height {
            rendered = rendered.resize_exact(width, height, FilterType::Triangle);
        }
        debug!(page_number, width, height, "Page rendered with PDFium");

        Ok(PageImage::new(
            DynamicImage::ImageRgb8(rendered.to_rgb8()),
            page_number,
            scale,
        ))
    }
}

/// Bind the PDFium library: the explicit path in `PDFIUM_DYNAMIC_LIB_PATH`,
/// then the executable's directory, then the system search path.
fn load_pdfium() -> Result<Pdfium> {
    if let Ok(path) = std::env::var(LIBRARY_PATH_ENV) {
        let bindings = Pdfium::bind_to_library(&path).map_err(|err| {
            FolioError::EngineUnavailable(format!("failed to load PDFium from {path}: {err}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(dir) = executable_dir() {
        let lib = Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib) {
            debug!(dir = %dir.display(), "PDFium loaded next to the executable");
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|err| {
        FolioError::EngineUnavailable(format!(
            "PDFium library not found; install it or set {LIBRARY_PATH_ENV}: {err}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::fixtures::text_pdf;

    // These need a PDFium library on the machine; without one there is
    // nothing to render with.
    fn renderer() -> Option<PdfiumRasterizer> {
        match PdfiumRasterizer::new() {
            Ok(renderer) => Some(renderer),
            Err(err) => {
                eprintln!("skipping: {err}");
                None
            }
        }
    }

    #[test]
    fn vector_text_is_drawn() {
        let Some(renderer) = renderer() else { return };
        let pdf = text_pdf(&[Some("HELLO WORLD THIS IS TEXT")]);
        let page = renderer.render(&pdf, 1, 1.0).unwrap();

        assert_eq!((page.width(), page.height()), (612, 792));
        let dark = page
            .as_dynamic()
            .to_luma8()
            .pixels()
            .filter(|p| p.0[0] < 128)
            .count();
        assert!(dark > 50, "dark pixels on a text page: {dark}");
    }

    #[test]
    fn pages_outside_the_document_are_rejected() {
        let Some(renderer) = renderer() else { return };
        let pdf = text_pdf(&[Some("one")]);
        assert!(matches!(
            renderer.render(&pdf, 2, 1.0),
            Err(FolioError::InvalidPage { page: 2, total: 1 })
        ));
        assert!(matches!(
            renderer.render(&pdf, 1, 0.0),
            Err(FolioError::Render(_))
        ));
    }

    #[test]
    fn garbage_is_a_pdf_error() {
        let Some(renderer) = renderer() else { return };
        assert!(matches!(
            renderer.render(b"not a pdf", 1, 1.0),
            Err(FolioError::PdfError(_))
        ));
    }
}
