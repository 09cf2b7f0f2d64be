// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document session — one viewing session over one document, with a
// per-page transcript cache for page navigation.

use std::collections::HashMap;
use std::sync::Arc;

use folio_core::error::Result;
use folio_core::types::{
    DocumentId, PageTranscript, RecognitionOptions, SessionId, SourceFile, TranscriptResult,
};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::orchestrator::Orchestrator;
use crate::traits::ProgressSink;

/// Transcripts of one document's pages, fetched lazily and kept for the
/// lifetime of the session.
///
/// Reads run concurrently. Inserts are serialised by the write lock, and a
/// later insert for the same page replaces the earlier one.
pub struct DocumentSession {
    id: SessionId,
    file: SourceFile,
    options: RecognitionOptions,
    orchestrator: Arc<Orchestrator>,
    pages: RwLock<HashMap<u32, PageTranscript>>,
    page_count: OnceCell<u32>,
}

impl DocumentSession {
    pub fn new(orchestrator: Arc<Orchestrator>, file: SourceFile, options: RecognitionOptions) -> Self {
        let id = SessionId::new();
        debug!(session = %id, name = file.name(), "Session opened");
        Self {
            id,
            file,
            options,
            orchestrator,
            pages: RwLock::new(HashMap::new()),
            page_count: OnceCell::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    pub fn document_id(&self) -> DocumentId {
        self.file.document_id()
    }

    /// Page count of the document (1 for non-paginated files).
    pub async fn page_count(&self) -> u32 {
        *self
            .page_count
            .get_or_init(|| self.orchestrator.page_count(&self.file))
            .await
    }

    /// Run the full chain and seed the cache with the pages that contributed.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn transcribe(&self, on_progress: &ProgressSink<'_>) -> Result<TranscriptResult> {
        let result = self
            .orchestrator
            .transcribe(&self.file, &self.options, on_progress)
            .await?;

        let _ = self.page_count.set(result.total_pages);
        let mut pages = self.pages.write().await;
        for page in &result.pages {
            pages.insert(page.page_number, page.clone());
        }
        info!(cached = pages.len(), "Page cache seeded");

        Ok(result)
    }

    /// Transcript of page `page_number`.
    ///
    /// Out-of-range numbers fall back to page 1. Cached pages are returned
    /// without touching any engine; others run the single-page chain and are
    /// cached when they produce text.
    #[instrument(skip(self, on_progress), fields(session = %self.id))]
    pub async fn page(&self, page_number: u32, on_progress: &ProgressSink<'_>) -> Result<PageTranscript> {
        let total = self.page_count().await;
        let page_number = if page_number == 0 || page_number > total {
            warn!(requested = page_number, total, "Page out of range; showing page 1");
            1
        } else {
            page_number
        };

        if let Some(hit) = self.pages.read().await.get(&page_number) {
            debug!(page_number, "Page cache hit");
            return Ok(hit.clone());
        }

        debug!(page_number, "Page cache miss");
        let transcript = self
            .orchestrator
            .transcribe_page(&self.file, page_number, &self.options, on_progress)
            .await?;

        self.pages
            .write()
            .await
            .insert(page_number, transcript.clone());
        Ok(transcript)
    }

    /// Cached transcripts ordered by page number.
    pub async fn cached_pages(&self) -> Vec<PageTranscript> {
        let mut pages: Vec<PageTranscript> = self.pages.read().await.values().cloned().collect();
        pages.sort_by_key(|page| page.page_number);
        pages
    }
}
