// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition settings — the fixed decision table from caller options to
// engine configuration.

use folio_core::types::RecognitionOptions;
use serde::{Deserialize, Serialize};

/// Engine variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineMode {
    /// Default neural engine.
    Fast,
    /// Engine tuned for handwriting.
    Legacy,
}

/// Page segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Segmentation {
    /// Automatic layout analysis with orientation detection.
    AutoWithOrientation,
    /// Automatic layout analysis.
    Auto,
    /// Treat the image as one uniform block of text.
    SingleBlock,
}

/// Engine configuration derived from [`RecognitionOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognitionSettings {
    pub engine_mode: EngineMode,
    pub segmentation: Segmentation,
    pub dictionary: bool,
}

impl RecognitionSettings {
    /// | handwriting | quick | engine | segmentation | dictionary |
    /// |---|---|---|---|---|
    /// | false | any | fast | auto + orientation | on |
    /// | true | true | fast | auto | on |
    /// | true | false | legacy | single block | off |
    pub fn for_options(options: &RecognitionOptions) -> Self {
        match (options.optimize_for_handwriting, options.quick_mode) {
            (false, _) => Self {
                engine_mode: EngineMode::Fast,
                segmentation: Segmentation::AutoWithOrientation,
                dictionary: true,
            },
            (true, true) => Self {
                engine_mode: EngineMode::Fast,
                segmentation: Segmentation::Auto,
                dictionary: true,
            },
            (true, false) => Self {
                engine_mode: EngineMode::Legacy,
                segmentation: Segmentation::SingleBlock,
                dictionary: false,
            },
        }
    }
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self::for_options(&RecognitionOptions::default())
    }
}
