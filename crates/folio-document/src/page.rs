// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Rendered page raster — the unit handed between rasteriser, preprocessor,
// and recognition engine.

use image::DynamicImage;
use folio_core::error::{FolioError, Result};

/// A raster of one page together with where it came from.
///
/// Produced by the rasteriser (or decoded from an uploaded image), consumed by
/// the preprocessor and recogniser, then dropped.
#[derive(Debug, Clone)]
pub struct PageImage {
    image: DynamicImage,
    /// 1-indexed source page.
    page_number: u32,
    /// Scale factor relative to the page's natural size.
    scale: f32,
}

impl PageImage {
    pub fn new(image: DynamicImage, page_number: u32, scale: f32) -> Self {
        Self {
            image,
            page_number,
            scale,
        }
    }

    /// Decode an uploaded image file as page 1 at natural scale.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| {
            FolioError::ImageError(format!("failed to decode image: {}", err))
        })?;
        Ok(Self::new(image, 1, 1.0))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Replace the pixels, keeping the page number and folding `factor` into
    /// the recorded scale.
    pub fn with_image(self, image: DynamicImage, factor: f32) -> Self {
        Self {
            image,
            page_number: self.page_number,
            scale: self.scale * factor,
        }
    }
}
