// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people transcribing documents.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Only the mapped message is ever shown to the user.

use crate::error::{ExhaustionReason, FolioError};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, busy service — trying again may help.
    Transient,
    /// User must do something (pick another file, install models).
    ActionRequired,
    /// Cannot be fixed by retrying — the document has nothing we can read.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying the same upload again is worthwhile.
    pub retriable: bool,
    /// Severity level.
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        FolioError::Exhausted(ExhaustionReason::NoExtractableText) => HumanError {
            message: "This document may not contain extractable text.".into(),
            suggestion: "Check that the file is a PDF or an image of a page with visible writing. Very faint or blank scans cannot be read.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FolioError::Exhausted(ExhaustionReason::AllMethodsFailed) => HumanError {
            message: "We tried every way we know to read this document, and none of them worked.".into(),
            suggestion: "Try again in a moment. If it keeps failing, try a clearer scan or a smaller file.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FolioError::EngineUnavailable(_) => HumanError {
            message: "Text recognition isn't ready yet.".into(),
            suggestion: "The recognition models may still be loading or are not installed. Wait a moment, or install the models, then try again.".into(),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        FolioError::InvalidPage { total, .. } => HumanError {
            message: "That page doesn't exist in this document.".into(),
            suggestion: format!("Pick a page between 1 and {total}."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FolioError::Render(_) => HumanError {
            message: "We couldn't turn this page into an image.".into(),
            suggestion: "The page may use features we can't draw. Try exporting it as an image first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FolioError::Recognition(_) => HumanError {
            message: "Text recognition didn't work on this page.".into(),
            suggestion: "Try scanning the document again with better lighting, making sure the text is clear and in focus.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FolioError::UnsupportedDocument(detail) => HumanError {
            message: "This type of document isn't supported.".into(),
            suggestion: format!("Upload a PDF or an image (PNG, JPEG, TIFF). (File type: {detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        FolioError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it on a computer first to check it works, or try a different file.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FolioError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        FolioError::ServerProcessing(_) => HumanError {
            message: "The processing service couldn't be reached.".into(),
            suggestion: "Check your connection and try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FolioError::Storage(_) => HumanError {
            message: "The transcript couldn't be saved or loaded.".into(),
            suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        FolioError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to read that file.".into(),
                    suggestion: "Check the file permissions, or try copying the file to a different location first.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your device's storage may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        FolioError::Serialization(_) => HumanError {
            message: "We had an internal data problem.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}
