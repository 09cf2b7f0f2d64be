// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — Synchronous document operations for the Folio transcription
// engine.
//
// Provides PDF operations (page inspection, text-layer extraction, page
// rasterisation), image processing (scale, grayscale, contrast, threshold),
// a recognition pipeline (preprocessing, engine settings, OCR), and the
// transcript formatter applied before display or storage.

pub mod format;
pub mod image;
pub mod page;
pub mod pdf;
pub mod scan;

// Re-export the primary items so callers can use `folio_document::PdfReader` etc.
pub use format::format_transcript;
pub use crate::image::processor::ImageProcessor;
pub use page::PageImage;
pub use pdf::rasterizer::{DEFAULT_RENDER_SCALE, PageRasterizer};
pub use pdf::reader::PdfReader;
pub use pdf::text_layer::TextLayerExtractor;
pub use scan::enhance::ImagePreprocessor;
pub use scan::recognition::{EngineMode, RecognitionSettings, Segmentation};

#[cfg(feature = "pdfium")]
pub use pdf::pdfium::PdfiumRasterizer;

#[cfg(feature = "ocr")]
pub use scan::ocr::{OcrEngine, model_directory, models_available};
