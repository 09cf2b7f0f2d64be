// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — scale, grayscale, contrast, threshold, and re-encoding.
// Operates on in-memory images using the `image` and `imageproc` crates.

use image::imageops::FilterType;
use image::DynamicImage;
use imageproc::contrast::{ThresholdType, threshold};
use folio_core::error::{FolioError, Result};
use tracing::{debug, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining.
///
/// ```ignore
/// let jpeg = ImageProcessor::from_bytes(&upload)?
///     .scale(0.75)
///     .grayscale()
///     .adjust_contrast(1.3)
///     .threshold(128)
///     .to_jpeg_bytes(85)?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            FolioError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Scale both edges by `factor`, rounding and never below 1 px. A factor
    /// of 1.0 (or anything non-positive) leaves the image untouched.
    #[instrument(skip(self))]
    pub fn scale(self, factor: f32) -> Self {
        if !factor.is_finite() || factor <= 0.0 || (factor - 1.0).abs() < f32::EPSILON {
            return self;
        }

        let width = ((self.image.width() as f32 * factor).round() as u32).max(1);
        let height = ((self.image.height() as f32 * factor).round() as u32).max(1);
        debug!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            width,
            height,
            "Scaling image"
        );

        Self {
            image: self.image.resize_exact(width, height, FilterType::Triangle),
        }
    }

    /// Convert the image to grayscale (luma).
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Adjust contrast by a factor around mid-gray. Values > 1.0 increase
    /// contrast; 1.0 is a no-op. Grayscale images stay grayscale.
    #[instrument(skip(self))]
    pub fn adjust_contrast(self, factor: f32) -> Self {
        let adjust = |channel: u8| -> u8 {
            let val = factor * (channel as f32 - 128.0) + 128.0;
            val.round().clamp(0.0, 255.0) as u8
        };

        let image = match self.image {
            DynamicImage::ImageLuma8(mut gray) => {
                for pixel in gray.pixels_mut() {
                    pixel.0[0] = adjust(pixel.0[0]);
                }
                DynamicImage::ImageLuma8(gray)
            }
            other => {
                let mut rgba = other.to_rgba8();
                for pixel in rgba.pixels_mut() {
                    let image::Rgba([r, g, b, a]) = *pixel;
                    *pixel = image::Rgba([adjust(r), adjust(g), adjust(b), a]);
                }
                DynamicImage::ImageRgba8(rgba)
            }
        };

        Self { image }
    }

    /// Binarize: pixels brighter than `level` become white, the rest black.
    pub fn threshold(self, level: u8) -> Self {
        let gray = self.image.to_luma8();
        Self {
            image: DynamicImage::ImageLuma8(threshold(&gray, level, ThresholdType::Binary)),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        let result = match &self.image {
            DynamicImage::ImageLuma8(gray) => gray.write_with_encoder(encoder),
            other => other.to_rgb8().write_with_encoder(encoder),
        };
        result.map_err(|err| FolioError::ImageError(format!("JPEG encoding failed: {}", err)))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            let v = (x * 255 / width.max(1)) as u8;
            Rgb([v, v, v])
        }))
    }

    #[test]
    fn scale_rounds_edges() {
        let scaled = ImageProcessor::from_dynamic(gradient(200, 100)).scale(0.75);
        assert_eq!((scaled.width(), scaled.height()), (150, 75));

        let tiny = ImageProcessor::from_dynamic(gradient(1, 1)).scale(0.1);
        assert_eq!((tiny.width(), tiny.height()), (1, 1));
    }

    #[test]
    fn unit_scale_is_identity() {
        let original = gradient(10, 10);
        let same = ImageProcessor::from_dynamic(original.clone()).scale(1.0);
        assert_eq!(same.as_dynamic().to_rgb8(), original.to_rgb8());
    }

    #[test]
    fn contrast_spreads_values_from_mid_gray() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[100u8, 128, 200][x as usize]]));
        let out = ImageProcessor::from_dynamic(DynamicImage::ImageLuma8(gray))
            .adjust_contrast(1.3)
            .into_dynamic()
            .to_luma8();
        assert_eq!(out.get_pixel(0, 0).0[0], 92);
        assert_eq!(out.get_pixel(1, 0).0[0], 128);
        assert_eq!(out.get_pixel(2, 0).0[0], 222);
    }

    #[test]
    fn threshold_produces_only_black_and_white() {
        let out = ImageProcessor::from_dynamic(gradient(64, 4))
            .grayscale()
            .threshold(128)
            .into_dynamic()
            .to_luma8();
        assert!(out.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        assert!(out.pixels().any(|p| p.0[0] == 0));
        assert!(out.pixels().any(|p| p.0[0] == 255));
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let jpeg = ImageProcessor::from_dynamic(gradient(32, 16))
            .grayscale()
            .to_jpeg_bytes(85)
            .unwrap();
        let decoded = ImageProcessor::from_bytes(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn undecodable_bytes_are_an_image_error() {
        assert!(matches!(
            ImageProcessor::from_bytes(b"nope"),
            Err(FolioError::ImageError(_))
        ));
    }
}
