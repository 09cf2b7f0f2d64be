// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a transcription run gave up after every strategy was tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExhaustionReason {
    /// Every strategy ran cleanly but found nothing, or the file is neither
    /// a paginated document nor an image.
    NoExtractableText,
    /// At least one strategy failed outright and none produced text.
    AllMethodsFailed,
}

impl std::fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoExtractableText => {
                f.write_str("this document may not contain extractable text")
            }
            Self::AllMethodsFailed => f.write_str("all text extraction methods failed"),
        }
    }
}

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Engine readiness --
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    // -- Stage errors --
    #[error("page {page} out of range (document has {total} pages)")]
    InvalidPage { page: u32, total: u32 },

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    // -- Document errors --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Collaborators --
    #[error("server processing failed: {0}")]
    ServerProcessing(String),

    #[error("transcript storage failed: {0}")]
    Storage(String),

    // -- Terminal --
    #[error("transcription failed: {0}")]
    Exhausted(ExhaustionReason),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolioError {
    /// Whether this error must stop a fallback chain instead of advancing it.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_))
    }

    /// Whether the input itself could not be parsed or decoded.
    pub fn is_unreadable_input(&self) -> bool {
        matches!(
            self,
            Self::PdfError(_) | Self::ImageError(_) | Self::UnsupportedDocument(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
