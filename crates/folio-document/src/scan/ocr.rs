// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) engine for Folio.
//
// Recognises text in page rasters using the `ocrs` crate, a pure-Rust OCR
// engine backed by neural network models executed via `rten`.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// folio-document = { path = "crates/folio-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`) — locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`) — decodes characters from detected regions.
//
// Running the `ocrs-cli` tool once downloads both:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png  # downloads models to ~/.cache/ocrs/
//   ```
//
// The default cache directory is `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`).

use std::path::{Path, PathBuf};

use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use folio_core::error::{FolioError, Result};
use rten::Model;
use tracing::{debug, info, instrument, warn};

use super::recognition::{EngineMode, RecognitionSettings, Segmentation};
use super::ticks::{LINES_PER_TICK, TICK_LINES, TICK_PREPARED, TICK_WORDS, line_ticks};
use crate::page::PageImage;

/// Default directory for cached OCR model files.
///
/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs` when
/// `XDG_CACHE_HOME` is unset.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// The bundled models are trained on Latin-script English text.
const MODEL_LANGUAGE: &str = "eng";

/// Configuration for constructing an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects the directory to contain `text-detection.rten` and
    /// `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for path in [&self.detection_model_path, &self.recognition_model_path] {
            if !path.exists() {
                return Err(FolioError::EngineUnavailable(format!(
                    "OCR model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Folio OCR engine.
///
/// Models are loaded once at construction; the engine is then reused for
/// every page. `ocrs` and `rten` must be compiled in release mode, debug
/// builds are 10-100x slower.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load models from the paths given in `config`.
    ///
    /// Missing or corrupt models yield [`FolioError::EngineUnavailable`].
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = load_model(&config.detection_model_path)?;

        info!("Loading OCR recognition model");
        let recognition_model = load_model(&config.recognition_model_path)?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            FolioError::EngineUnavailable(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Load models from `dir`.
    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(OcrConfig::from_dir(dir))
    }

    /// Recognise the text of one page.
    ///
    /// `on_progress` receives every completion tick in [0, 1]; the last tick is
    /// always 1.0. Finding no text is not an error: the result is then empty.
    #[instrument(skip_all, fields(page = image.page_number(), width = image.width(), height = image.height()))]
    pub fn recognize(
        &self,
        image: &PageImage,
        settings: &RecognitionSettings,
        language: &str,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<String> {
        if !language.eq_ignore_ascii_case(MODEL_LANGUAGE) {
            warn!(language, "No model for requested language; using {MODEL_LANGUAGE}");
        }
        if settings.engine_mode == EngineMode::Legacy || !settings.dictionary {
            debug!(
                engine_mode = ?settings.engine_mode,
                dictionary = settings.dictionary,
                "Single recognition model; mode is advisory"
            );
        }

        let rgb = image.as_dynamic().to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            FolioError::Recognition(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| FolioError::Recognition(format!("OCR preprocessing failed: {}", err)))?;
        on_progress(TICK_PREPARED);

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|err| FolioError::Recognition(format!("word detection failed: {}", err)))?;
        on_progress(TICK_WORDS);

        let lines = self.engine.find_text_lines(&input, &words);
        on_progress(TICK_LINES);
        debug!(words = words.len(), lines = lines.len(), "Text layout found");

        let mut texts: Vec<String> = Vec::with_capacity(lines.len());
        let mut ticks = line_ticks(lines.len()).into_iter();
        for batch in lines.chunks(LINES_PER_TICK) {
            let recognised = self.engine.recognize_text(&input, batch).map_err(|err| {
                FolioError::Recognition(format!("line recognition failed: {}", err))
            })?;
            texts.extend(
                recognised
                    .iter()
                    .flatten()
                    .map(|line| line.to_string())
                    .filter(|line| !line.trim().is_empty()),
            );
            if let Some(tick) = ticks.next() {
                on_progress(tick);
            }
        }
        // No lines: the single completion tick.
        ticks.for_each(|tick| on_progress(tick));

        let text = join_lines(&texts, settings.segmentation);
        debug!(lines = texts.len(), chars = text.len(), "OCR recognition complete");
        Ok(text)
    }
}

fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        FolioError::EngineUnavailable(format!(
            "failed to load OCR model from {}: {}",
            path.display(),
            err
        ))
    })
}

/// Single-block segmentation yields one run of text; the automatic modes
/// keep one line per detected text line.
fn join_lines(lines: &[String], segmentation: Segmentation) -> String {
    let separator = match segmentation {
        Segmentation::SingleBlock => " ",
        Segmentation::Auto | Segmentation::AutoWithOrientation => "\n",
    };
    lines
        .iter()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Whether both model files exist in `dir` (or the default cache directory).
pub fn models_available(dir: Option<&Path>) -> bool {
    let config = dir.map(OcrConfig::from_dir).unwrap_or_default();
    config.validate().is_ok()
}

/// Directory models are read from when none is configured.
pub fn model_directory() -> PathBuf {
    default_model_dir()
}
