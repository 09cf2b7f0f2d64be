// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-acquisition strategies and the order in which they are tried.

use std::fmt;

use folio_core::error::{ExhaustionReason, FolioError};
use folio_core::types::{MediaType, PageRange, PageTranscript, TranscriptMethod};

/// One candidate way of obtaining a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Embedded text of the capped page range.
    TextLayer { range: PageRange },
    /// Rasterise one page, optionally preprocess, recognise.
    PageRecognition { page: u32 },
    /// Decode the uploaded image, optionally preprocess, recognise.
    ImageRecognition,
    /// Hand the original file to the processing server.
    Server,
    /// Recognise the original file once more, without preprocessing.
    LastResort { range: PageRange },
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TextLayer { range } => write!(f, "text-layer(pages {}-{})", range.start, range.end),
            Self::PageRecognition { page } => write!(f, "page-recognition(page {page})"),
            Self::ImageRecognition => f.write_str("image-recognition"),
            Self::Server => f.write_str("server"),
            Self::LastResort { .. } => f.write_str("last-resort-recognition"),
        }
    }
}

/// Full fallback chain for a document.
///
/// `range` is the capped page range of a paginated document and is ignored
/// for everything else.
pub fn document_plan(media: &MediaType, range: PageRange) -> Vec<Strategy> {
    if media.is_paginated() {
        vec![
            Strategy::TextLayer { range },
            Strategy::PageRecognition { page: range.start.max(1) },
            Strategy::Server,
            Strategy::LastResort { range },
        ]
    } else if media.is_image() {
        vec![
            Strategy::ImageRecognition,
            Strategy::Server,
            Strategy::LastResort {
                range: PageRange::single(1),
            },
        ]
    } else {
        vec![Strategy::Server]
    }
}

/// Single-page chain used when navigating to a page that is not cached.
pub fn page_plan(media: &MediaType, page: u32) -> Vec<Strategy> {
    if media.is_paginated() {
        vec![
            Strategy::TextLayer {
                range: PageRange::single(page),
            },
            Strategy::PageRecognition { page },
        ]
    } else if media.is_image() {
        vec![Strategy::ImageRecognition]
    } else {
        Vec::new()
    }
}

/// A strategy's successful output. `text` is non-empty.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub text: String,
    pub method: TranscriptMethod,
    pub pages: Vec<PageTranscript>,
}

/// Why a strategy did not produce a transcript.
#[derive(Debug)]
pub enum StrategyError {
    /// Ran fine but produced too little text.
    Insufficient(String),
    /// Raised an error.
    Failed(FolioError),
}

impl From<FolioError> for StrategyError {
    fn from(err: FolioError) -> Self {
        Self::Failed(err)
    }
}

pub type StrategyResult = std::result::Result<Accepted, StrategyError>;

/// Accept recognised text when its trimmed form is non-empty.
pub fn accept_recognised(text: &str, pages: Vec<PageTranscript>) -> StrategyResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StrategyError::Insufficient("recognition found no text".into()));
    }
    Ok(Accepted {
        text: trimmed.to_string(),
        method: TranscriptMethod::Ocr,
        pages,
    })
}

/// Accept extracted text when its trimmed form is longer than `min_chars`.
pub fn accept_extracted(text: &str, min_chars: usize, pages: Vec<PageTranscript>) -> StrategyResult {
    let trimmed = text.trim();
    let chars = trimmed.chars().count();
    if chars <= min_chars {
        return Err(StrategyError::Insufficient(format!(
            "text layer has {chars} characters, need more than {min_chars}"
        )));
    }
    Ok(Accepted {
        text: trimmed.to_string(),
        method: TranscriptMethod::Extracted,
        pages,
    })
}

/// Outcome bookkeeping across one chain run.
#[derive(Debug, Default)]
pub struct Attempts {
    pub insufficient: usize,
    pub unreadable: usize,
    pub failed: usize,
}

impl Attempts {
    /// Count an error raised by a strategy. A file that cannot be parsed or
    /// decoded counts as yielding no text, not as a failed method.
    pub fn record_error(&mut self, err: &FolioError) {
        if err.is_unreadable_input() {
            self.unreadable += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Terminal reason once every strategy is spent.
    pub fn exhaustion_reason(&self, media: &MediaType) -> ExhaustionReason {
        let readable = media.is_paginated() || media.is_image();
        if readable && self.failed > 0 {
            ExhaustionReason::AllMethodsFailed
        } else {
            ExhaustionReason::NoExtractableText
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_plan_order() {
        let plan = document_plan(&MediaType::Pdf, PageRange::first(3));
        assert_eq!(
            plan,
            vec![
                Strategy::TextLayer {
                    range: PageRange::first(3)
                },
                Strategy::PageRecognition { page: 1 },
                Strategy::Server,
                Strategy::LastResort {
                    range: PageRange::first(3)
                },
            ]
        );
    }

    #[test]
    fn image_and_other_plans() {
        assert_eq!(
            document_plan(&MediaType::Png, PageRange::first(3))[0],
            Strategy::ImageRecognition
        );
        assert_eq!(
            document_plan(&MediaType::Other("text/plain".into()), PageRange::first(1)),
            vec![Strategy::Server]
        );
        assert!(page_plan(&MediaType::Other("text/plain".into()), 1).is_empty());
        assert_eq!(page_plan(&MediaType::Pdf, 4).len(), 2);
    }

    #[test]
    fn extracted_threshold_is_strict() {
        assert!(accept_extracted("  0123456789  ", 10, Vec::new()).is_err());
        let accepted = accept_extracted(" 0123456789A ", 10, Vec::new()).unwrap();
        assert_eq!(accepted.text, "0123456789A");
        assert_eq!(accepted.method, TranscriptMethod::Extracted);
    }

    #[test]
    fn recognised_needs_non_blank() {
        assert!(matches!(
            accept_recognised(" \n\t ", Vec::new()),
            Err(StrategyError::Insufficient(_))
        ));
        assert_eq!(accept_recognised(" a ", Vec::new()).unwrap().text, "a");
    }

    #[test]
    fn exhaustion_reason_rule() {
        let mut attempts = Attempts::default();
        attempts.insufficient = 4;
        assert_eq!(
            attempts.exhaustion_reason(&MediaType::Pdf),
            ExhaustionReason::NoExtractableText
        );
        attempts.record_error(&FolioError::PdfError("no trailer".into()));
        attempts.record_error(&FolioError::ImageError("truncated".into()));
        assert_eq!(attempts.unreadable, 2);
        assert_eq!(
            attempts.exhaustion_reason(&MediaType::Pdf),
            ExhaustionReason::NoExtractableText
        );
        attempts.record_error(&FolioError::Recognition("engine crashed".into()));
        assert_eq!(
            attempts.exhaustion_reason(&MediaType::Pdf),
            ExhaustionReason::AllMethodsFailed
        );
        assert_eq!(
            attempts.exhaustion_reason(&MediaType::Other("x/y".into())),
            ExhaustionReason::NoExtractableText
        );
    }
}
