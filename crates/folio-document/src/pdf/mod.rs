// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — page inspection, text-layer extraction, and rasterisation.

#[cfg(feature = "pdfium")]
pub mod pdfium;
pub mod rasterizer;
pub mod reader;
pub mod text_layer;

pub use rasterizer::PageRasterizer;
pub use reader::PdfReader;
pub use text_layer::TextLayerExtractor;

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRasterizer;
