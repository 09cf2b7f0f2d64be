// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-layer extraction — read the embedded text of a page range without
// any recognition.

use folio_core::error::Result;
use folio_core::types::{PageRange, PageTranscript};
use tracing::{debug, instrument, warn};

use super::reader::PdfReader;

/// Reads the embedded text layer of a PDF.
pub struct TextLayerExtractor;

impl TextLayerExtractor {
    /// Total page count of the document.
    pub fn page_count(data: &[u8]) -> Result<u32> {
        Ok(PdfReader::from_bytes(data)?.page_count())
    }

    /// Text of each page in `range` that has any, clamped to the document.
    ///
    /// Items within a page are joined by single spaces. A page that cannot be
    /// read is skipped with a warning.
    #[instrument(skip(data), fields(bytes_len = data.len()))]
    pub fn extract_pages(data: &[u8], range: PageRange) -> Result<Vec<PageTranscript>> {
        let reader = PdfReader::from_bytes(data)?;
        let last = range.end.min(reader.page_count());

        let mut pages = Vec::new();
        for page_number in range.start.max(1)..=last {
            match reader.page_text_items(page_number) {
                Ok(items) if items.is_empty() => {
                    debug!(page_number, "Page has no text layer");
                }
                Ok(items) => pages.push(PageTranscript {
                    page_number,
                    text: items.join(" "),
                }),
                Err(err) => {
                    warn!(page_number, error = %err, "Skipping unreadable page text");
                }
            }
        }

        debug!(pages = pages.len(), "Text layer read");
        Ok(pages)
    }

    /// Text of the range with page texts separated by a blank line. May be
    /// empty.
    pub fn extract_text(data: &[u8], range: PageRange) -> Result<String> {
        let pages = Self::extract_pages(data, range)?;
        Ok(join_pages(&pages))
    }
}

/// Join page texts with a blank line between pages.
pub fn join_pages(pages: &[PageTranscript]) -> String {
    pages
        .iter()
        .map(|page| page.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
