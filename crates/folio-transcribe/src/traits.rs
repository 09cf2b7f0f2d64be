// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability traits for the transcription pipeline.
//
// The orchestrator receives ready-to-use handles to each capability at
// construction; engine initialisation happens before the first call, never
// inside the fallback chain.

use async_trait::async_trait;
use folio_core::error::Result;
use folio_core::types::{
    DocumentId, PageRange, PageTranscript, ProgressEvent, RecognitionOptions, ServerTranscript,
    SourceFile, StoredTranscript,
};
use folio_document::PageImage;

/// Receives document-level progress events. The lifetime lets callers pass
/// closures that borrow local state.
pub type ProgressSink<'a> = dyn Fn(ProgressEvent) + Send + Sync + 'a;

/// Receives recognition completion ticks in [0, 1].
pub type TickSink<'a> = dyn Fn(f32) + Send + Sync + 'a;

/// Renders one page of a paginated document.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render 1-indexed `page_number` at `scale`. Out-of-range pages fail
    /// with `InvalidPage`.
    async fn render(&self, file: &SourceFile, page_number: u32, scale: f32) -> Result<PageImage>;
}

/// Reads the embedded text layer of a paginated document.
#[async_trait]
pub trait TextLayer: Send + Sync {
    async fn page_count(&self, file: &SourceFile) -> Result<u32>;

    /// Text of each page in `range` that has any. An empty vector is a valid
    /// answer.
    async fn extract_pages(&self, file: &SourceFile, range: PageRange)
    -> Result<Vec<PageTranscript>>;
}

/// Optical character recognition.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Recognise the text in `image`. Finding nothing yields an empty string;
    /// `on_progress` sees every tick, ending at 1.0.
    async fn recognize(
        &self,
        image: PageImage,
        options: &RecognitionOptions,
        on_progress: &TickSink<'_>,
    ) -> Result<String>;
}

/// Remote processing service used when local strategies come up empty.
#[async_trait]
pub trait ServerProcessor: Send + Sync {
    async fn process(&self, file: &SourceFile) -> Result<ServerTranscript>;
}

/// Persistence of finished transcripts.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn save(&self, record: &StoredTranscript) -> Result<()>;

    async fn load(&self, id: &DocumentId) -> Result<Option<StoredTranscript>>;
}
