// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan preprocessing — downscale, grayscale, contrast boost and binarization
// ahead of recognition, tuned per quality level.

use folio_core::error::Result;
use folio_core::types::PreprocessQuality;
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;
use crate::page::PageImage;

/// Linear contrast stretch applied at every quality level.
pub const CONTRAST_FACTOR: f32 = 1.3;

/// Midpoint used for binarization at medium and high quality.
pub const BINARIZE_LEVEL: u8 = 128;

/// Prepares page rasters for recognition.
///
/// A pure function of (image, quality): no state is kept between calls.
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Run the single-pass enhancement and return the re-decoded result.
    #[instrument(skip(image), fields(page = image.page_number(), width = image.width(), height = image.height()))]
    pub fn enhance(image: PageImage, quality: PreprocessQuality) -> Result<PageImage> {
        let factor = downscale_factor(quality, image.width(), image.height());
        let encoded = Self::enhance_to_jpeg(image.as_dynamic().clone(), quality)?;
        let decoded = ImageProcessor::from_bytes(&encoded)?.into_dynamic();

        debug!(
            factor,
            width = decoded.width(),
            height = decoded.height(),
            encoded_len = encoded.len(),
            "Page preprocessed"
        );
        Ok(image.with_image(decoded, factor))
    }

    /// Run the enhancement and return the encoded JPEG.
    pub fn enhance_to_jpeg(image: image::DynamicImage, quality: PreprocessQuality) -> Result<Vec<u8>> {
        let factor = downscale_factor(quality, image.width(), image.height());

        let mut processor = ImageProcessor::from_dynamic(image)
            .scale(factor)
            .grayscale()
            .adjust_contrast(CONTRAST_FACTOR);

        if binarizes(quality) {
            processor = processor.threshold(BINARIZE_LEVEL);
        }

        processor.to_jpeg_bytes(jpeg_quality(quality))
    }

    /// Best-effort orientation correction. Currently returns the image as-is.
    pub fn deskew(image: PageImage) -> PageImage {
        image
    }
}

/// Scale factor for a quality level, given the source dimensions.
pub fn downscale_factor(quality: PreprocessQuality, width: u32, height: u32) -> f32 {
    let longest = width.max(height);
    match quality {
        PreprocessQuality::Low if longest > 1000 => 0.5,
        PreprocessQuality::Low => 0.75,
        PreprocessQuality::Medium if longest > 1500 => 0.75,
        PreprocessQuality::Medium => 1.0,
        PreprocessQuality::High => 1.0,
    }
}

fn binarizes(quality: PreprocessQuality) -> bool {
    !matches!(quality, PreprocessQuality::Low)
}

/// JPEG quality for re-encoding (0.7 / 0.85 / 0.95 of full).
fn jpeg_quality(quality: PreprocessQuality) -> u8 {
    match quality {
        PreprocessQuality::Low => 70,
        PreprocessQuality::Medium => 85,
        PreprocessQuality::High => 95,
    }
}
