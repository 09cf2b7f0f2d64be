// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition pipeline — image preprocessing, engine settings, and optical
// character recognition (OCR).

pub mod enhance;
pub mod recognition;
pub mod ticks;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use enhance::ImagePreprocessor;
pub use recognition::RecognitionSettings;

#[cfg(feature = "ocr")]
pub use ocr::{OcrEngine, model_directory, models_available};
