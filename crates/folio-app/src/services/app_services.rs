// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — resolves the data directory, loads configuration,
// and wires the recognition engine, processing server, and transcript store
// into an orchestrator for the commands to use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_core::TranscribeConfig;
use folio_core::error::Result;
use folio_transcribe::{HttpServerProcessor, Orchestrator, Recognizer, UnavailableRecognizer};
use tracing::{info, warn};

use super::data_dir;
use super::transcript_files::JsonTranscriptStore;

const CONFIG_FILE: &str = "config.json";
const TRANSCRIPTS_DIR: &str = "transcripts";

pub struct AppServices {
    config: TranscribeConfig,
    store: JsonTranscriptStore,
}

impl AppServices {
    /// Initialise services in the platform data directory. Call once at
    /// startup.
    pub fn init() -> Result<Self> {
        Self::at(data_dir::data_dir()?)
    }

    /// Initialise services rooted at `dir`.
    pub fn at(dir: PathBuf) -> Result<Self> {
        info!(path = %dir.display(), "Initialising app services");
        let config = load_config(&dir).unwrap_or_default();
        let store = JsonTranscriptStore::new(data_dir::subdir(&dir, TRANSCRIPTS_DIR)?);

        Ok(Self {
            config,
            store,
        })
    }

    pub fn config(&self) -> &TranscribeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TranscribeConfig {
        &mut self.config
    }

    pub fn store(&self) -> &JsonTranscriptStore {
        &self.store
    }

    /// Orchestrator over local engines with the current configuration. The
    /// server strategy is enabled when a server URL is configured.
    pub fn orchestrator(&self) -> Result<Orchestrator> {
        let orchestrator = Orchestrator::local(recognizer(&self.config), self.config.clone());

        match &self.config.server_url {
            Some(url) if !url.trim().is_empty() => {
                let server = HttpServerProcessor::new(url, self.config.server_timeout())?;
                info!(url = server.base_url(), "Processing server enabled");
                Ok(orchestrator.with_server(Arc::new(server)))
            }
            _ => Ok(orchestrator),
        }
    }
}

#[cfg(feature = "ocr")]
fn recognizer(config: &TranscribeConfig) -> Arc<dyn Recognizer> {
    use folio_document::{OcrEngine, model_directory, models_available};
    use folio_transcribe::OcrsRecognizer;

    let dir = config.model_dir.clone().unwrap_or_else(model_directory);
    if !models_available(Some(dir.as_path())) {
        warn!(dir = %dir.display(), "OCR models missing; run `ocrs` once or set model_dir in config.json");
        return Arc::new(UnavailableRecognizer::new(format!(
            "no OCR models in {}",
            dir.display()
        )));
    }

    match OcrEngine::from_model_dir(&dir) {
        Ok(engine) => Arc::new(OcrsRecognizer::new(engine)),
        Err(e) => {
            warn!(error = %e, "OCR engine unavailable; recognition strategies will stop the chain");
            Arc::new(UnavailableRecognizer::new(e.to_string()))
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn recognizer(_config: &TranscribeConfig) -> Arc<dyn Recognizer> {
    warn!("Built without the `ocr` feature; only embedded text can be read locally");
    Arc::new(UnavailableRecognizer::new(
        "this build of folio has no OCR engine (rebuild with --features ocr)",
    ))
}

// -- Config file persistence -------------------------------------------------

fn load_config(data_dir: &Path) -> Option<TranscribeConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
            None
        }
    }
}
