// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transcription configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Policy knobs for a transcription run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeConfig {
    /// Maximum number of pages processed per document.
    pub page_cap: u32,
    /// Seconds before the "this is taking a while" advisory is shown.
    /// Processing is never cancelled.
    pub soft_timeout_secs: u64,
    /// Extracted text must be longer than this (after trimming) to count.
    pub min_extracted_chars: usize,
    /// Rasterisation scale factor applied to page dimensions.
    pub render_scale: f32,
    /// Recognition language used when the caller does not pick one.
    pub default_language: String,
    /// Base URL of the remote processing service, if any.
    pub server_url: Option<String>,
    /// Request timeout for the remote processing service.
    pub server_timeout_secs: u64,
    /// Directory holding OCR model files. `None` uses the engine's cache dir.
    pub model_dir: Option<PathBuf>,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            page_cap: 3,
            soft_timeout_secs: 15,
            min_extracted_chars: 10,
            render_scale: 1.5,
            default_language: "eng".into(),
            server_url: None,
            server_timeout_secs: 120,
            model_dir: None,
        }
    }
}

impl TranscribeConfig {
    pub fn soft_timeout(&self) -> Duration {
        Duration::from_secs(self.soft_timeout_secs)
    }

    pub fn server_timeout(&self) -> Duration {
        Duration::from_secs(self.server_timeout_secs)
    }
}
