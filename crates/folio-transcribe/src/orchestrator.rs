// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transcription orchestrator — runs the fallback chain for one document.
//
// Strategies are tried strictly in order, each at most once, and the first
// one producing text wins. Stage errors are logged and treated like an empty
// result; only an unavailable engine or exhaustion of the chain reaches the
// caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use folio_core::TranscribeConfig;
use folio_core::error::{FolioError, Result};
use folio_core::types::{
    PageRange, PageTranscript, PreprocessQuality, ProgressStage, RecognitionOptions, SourceFile,
    TranscriptResult,
};
use folio_document::pdf::text_layer::join_pages;
use folio_document::{ImagePreprocessor, PageImage};
use tracing::{debug, info, instrument, warn};

use crate::engines::{LocalRasterizer, LocalTextLayer};
use crate::progress::ProgressTracker;
use crate::strategy::{
    Accepted, Attempts, Strategy, StrategyError, StrategyResult, accept_extracted,
    accept_recognised, document_plan, page_plan,
};
use crate::traits::{PageRasterizer, ProgressSink, Recognizer, ServerProcessor, TextLayer};

const MSG_EXTRACTING: &str = "Extracting text...";
const MSG_RECOGNISING: &str = "No embedded text found. Running recognition...";
const MSG_FALLBACK: &str = "Trying fallback...";
const MSG_PREPROCESSING: &str = "Preprocessing image...";
const MSG_COMPLETE: &str = "Transcription complete";
const MSG_SLOW: &str =
    "This is taking longer than usual. Quick mode is faster for large or handwritten documents.";

/// Drives the fallback chain over injected capabilities.
pub struct Orchestrator {
    rasterizer: Arc<dyn PageRasterizer>,
    text_layer: Arc<dyn TextLayer>,
    recognizer: Arc<dyn Recognizer>,
    server: Option<Arc<dyn ServerProcessor>>,
    config: TranscribeConfig,
}

impl Orchestrator {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        text_layer: Arc<dyn TextLayer>,
        recognizer: Arc<dyn Recognizer>,
        config: TranscribeConfig,
    ) -> Self {
        Self {
            rasterizer,
            text_layer,
            recognizer,
            server: None,
            config,
        }
    }

    /// In-process rasteriser and text layer with the given recogniser.
    pub fn local(recognizer: Arc<dyn Recognizer>, config: TranscribeConfig) -> Self {
        Self::new(
            Arc::new(LocalRasterizer::new()),
            Arc::new(LocalTextLayer),
            recognizer,
            config,
        )
    }

    /// Enable the server-processing strategy.
    pub fn with_server(mut self, server: Arc<dyn ServerProcessor>) -> Self {
        self.server = Some(server);
        self
    }

    pub fn config(&self) -> &TranscribeConfig {
        &self.config
    }

    /// Page count of a paginated document, 1 for everything else.
    ///
    /// An unreadable page tree counts as one page.
    pub async fn page_count(&self, file: &SourceFile) -> u32 {
        if !file.media_type().is_paginated() {
            return 1;
        }
        match self.text_layer.page_count(file).await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "Could not count pages; assuming one");
                1
            }
        }
    }

    // -- Public operations ----------------------------------------------------

    /// Transcribe a whole document (up to the page cap).
    ///
    /// On success the text is non-empty. Progress goes to `on_progress`; once
    /// the soft timeout passes an advisory is emitted but work continues.
    #[instrument(skip_all, fields(
        name = file.name(),
        media = file.media_type().mime_type(),
        bytes_len = file.len(),
    ))]
    pub async fn transcribe(
        &self,
        file: &SourceFile,
        options: &RecognitionOptions,
        on_progress: &ProgressSink<'_>,
    ) -> Result<TranscriptResult> {
        let tracker = ProgressTracker::new(on_progress);
        let run = self.run_document(file, options, &tracker);
        with_soft_timeout(run, self.config.soft_timeout(), &tracker).await
    }

    /// Transcribe a single page: text layer first, then recognition of that
    /// page. Plain images only have page 1.
    #[instrument(skip(self, file, options, on_progress), fields(name = file.name()))]
    pub async fn transcribe_page(
        &self,
        file: &SourceFile,
        page: u32,
        options: &RecognitionOptions,
        on_progress: &ProgressSink<'_>,
    ) -> Result<PageTranscript> {
        let plan = page_plan(file.media_type(), page);
        if plan.is_empty() {
            return Err(FolioError::UnsupportedDocument(
                file.media_type().mime_type().to_string(),
            ));
        }

        let tracker = ProgressTracker::new(on_progress);
        let run = async {
            let accepted = self.run_chain(&plan, file, options, &tracker).await?;
            tracker.complete(MSG_COMPLETE);
            Ok::<_, FolioError>(PageTranscript {
                page_number: page,
                text: accepted.text,
            })
        };
        with_soft_timeout(run, self.config.soft_timeout(), &tracker).await
    }

    // -- Chain ----------------------------------------------------------------

    async fn run_document(
        &self,
        file: &SourceFile,
        options: &RecognitionOptions,
        tracker: &ProgressTracker<'_>,
    ) -> Result<TranscriptResult> {
        let cap = self.config.page_cap.max(1);
        let total_pages = self.page_count(file).await;
        let truncated = total_pages > cap;
        if truncated {
            info!(total_pages, cap, "Page cap reached; processing the first pages only");
        }

        let range = PageRange::first(total_pages.min(cap));
        let plan = document_plan(file.media_type(), range);
        let accepted = self.run_chain(&plan, file, options, tracker).await?;
        tracker.complete(MSG_COMPLETE);

        Ok(TranscriptResult {
            text: accepted.text,
            method: accepted.method,
            total_pages,
            truncated,
            pages: accepted.pages,
        })
    }

    async fn run_chain(
        &self,
        plan: &[Strategy],
        file: &SourceFile,
        options: &RecognitionOptions,
        tracker: &ProgressTracker<'_>,
    ) -> Result<Accepted> {
        let mut attempts = Attempts::default();

        for strategy in plan {
            tracker.reset();
            info!(%strategy, "Trying strategy");

            match self.attempt(*strategy, file, options, tracker).await {
                Ok(accepted) => {
                    info!(
                        %strategy,
                        method = %accepted.method,
                        chars = accepted.text.len(),
                        "Strategy produced text"
                    );
                    return Ok(accepted);
                }
                Err(StrategyError::Failed(err)) if err.is_unavailable() => {
                    warn!(%strategy, error = %err, "Engine unavailable; stopping");
                    return Err(err);
                }
                Err(StrategyError::Failed(err)) => {
                    warn!(%strategy, error = %err, "Strategy failed; falling through");
                    attempts.record_error(&err);
                }
                Err(StrategyError::Insufficient(reason)) => {
                    info!(%strategy, %reason, "Strategy insufficient; falling through");
                    attempts.insufficient += 1;
                }
            }
        }

        let reason = attempts.exhaustion_reason(file.media_type());
        warn!(
            %reason,
            insufficient = attempts.insufficient,
            unreadable = attempts.unreadable,
            failed = attempts.failed,
            "All strategies exhausted"
        );
        Err(FolioError::Exhausted(reason))
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        file: &SourceFile,
        options: &RecognitionOptions,
        tracker: &ProgressTracker<'_>,
    ) -> StrategyResult {
        match strategy {
            Strategy::TextLayer { range } => self.try_text_layer(file, range, tracker).await,
            Strategy::PageRecognition { page } => {
                self.try_page_recognition(file, page, options, tracker).await
            }
            Strategy::ImageRecognition => self.try_image_recognition(file, options, tracker).await,
            Strategy::Server => self.try_server(file, tracker).await,
            Strategy::LastResort { range } => {
                self.try_last_resort(file, range, options, tracker).await
            }
        }
    }

    // -- Strategies -----------------------------------------------------------

    async fn try_text_layer(
        &self,
        file: &SourceFile,
        range: PageRange,
        tracker: &ProgressTracker<'_>,
    ) -> StrategyResult {
        tracker.report(ProgressStage::PdfConversion, 0.0, MSG_EXTRACTING);
        let pages = self.text_layer.extract_pages(file, range).await?;
        tracker.report(ProgressStage::PdfConversion, 1.0, MSG_EXTRACTING);

        let text = join_pages(&pages);
        debug!(pages = pages.len(), chars = text.len(), "Text layer read");
        accept_extracted(&text, self.config.min_extracted_chars, pages)
    }

    async fn try_page_recognition(
        &self,
        file: &SourceFile,
        page: u32,
        options: &RecognitionOptions,
        tracker: &ProgressTracker<'_>,
    ) -> StrategyResult {
        tracker.report(ProgressStage::PdfConversion, 0.0, MSG_RECOGNISING);
        let image = self
            .rasterizer
            .render(file, page, self.config.render_scale)
            .await?;
        tracker.report(ProgressStage::PdfConversion, 1.0, MSG_RECOGNISING);

        let image = self.preprocess(image, options, tracker).await?;
        let text = self.recognize_page(image, options, 0, 1, tracker).await?;
        accept_recognised(&text, single_page(page, &text))
    }

    async fn try_image_recognition(
        &self,
        file: &SourceFile,
        options: &RecognitionOptions,
        tracker: &ProgressTracker<'_>,
    ) -> StrategyResult {
        let image = decode_image(file).await?;
        let image = self.preprocess(image, options, tracker).await?;
        let text = self.recognize_page(image, options, 0, 1, tracker).await?;
        accept_recognised(&text, single_page(1, &text))
    }

    async fn try_server(&self, file: &SourceFile, tracker: &ProgressTracker<'_>) -> StrategyResult {
        let Some(server) = &self.server else {
            return Err(StrategyError::Insufficient(
                "no processing server configured".into(),
            ));
        };

        tracker.report(ProgressStage::Ocr, 0.0, MSG_FALLBACK);
        let reply = server.process(file).await?;
        if reply.text.trim().is_empty() {
            return Err(StrategyError::Insufficient("server returned no text".into()));
        }

        // Server text covers the whole file; only a single image maps to a page.
        let pages = if file.media_type().is_image() {
            single_page(1, &reply.text)
        } else {
            Vec::new()
        };
        Ok(Accepted {
            text: reply.text,
            method: reply.method,
            pages,
        })
    }

    async fn try_last_resort(
        &self,
        file: &SourceFile,
        range: PageRange,
        options: &RecognitionOptions,
        tracker: &ProgressTracker<'_>,
    ) -> StrategyResult {
        tracker.report(ProgressStage::Ocr, 0.0, MSG_FALLBACK);

        if !file.media_type().is_paginated() {
            let image = decode_image(file).await?;
            let text = self.recognize_page(image, options, 0, 1, tracker).await?;
            return accept_recognised(&text, single_page(1, &text));
        }

        let total = range.len();
        let mut pages = Vec::new();
        let mut last_error = None;

        for (index, page) in range.pages().enumerate() {
            let outcome = match self
                .rasterizer
                .render(file, page, self.config.render_scale)
                .await
            {
                Ok(image) => {
                    self.recognize_page(image, options, index as u32, total, tracker)
                        .await
                }
                Err(err) => Err(err),
            };

            match outcome {
                Ok(text) if !text.trim().is_empty() => pages.push(PageTranscript {
                    page_number: page,
                    text: text.trim().to_string(),
                }),
                Ok(_) => debug!(page, "No text recognised on page"),
                Err(err) if err.is_unavailable() => return Err(err.into()),
                Err(err) => {
                    warn!(page, error = %err, "Page recognition failed; continuing");
                    last_error = Some(err);
                }
            }
        }

        if pages.is_empty() {
            if let Some(err) = last_error {
                return Err(StrategyError::Failed(err));
            }
        }

        let text = join_pages(&pages);
        accept_recognised(&text, pages)
    }

    // -- Stages ---------------------------------------------------------------

    async fn preprocess(
        &self,
        image: PageImage,
        options: &RecognitionOptions,
        tracker: &ProgressTracker<'_>,
    ) -> Result<PageImage> {
        if !options.enhance_contrast {
            return Ok(image);
        }

        let quality = PreprocessQuality::for_options(options);
        tracker.report(ProgressStage::Preprocessing, 0.0, MSG_PREPROCESSING);
        let enhanced = tokio::task::spawn_blocking(move || {
            ImagePreprocessor::enhance(ImagePreprocessor::deskew(image), quality)
        })
        .await
        .map_err(|err| FolioError::ImageError(format!("preprocessing task did not complete: {}", err)))??;
        tracker.report(ProgressStage::Preprocessing, 1.0, MSG_PREPROCESSING);

        Ok(enhanced)
    }

    async fn recognize_page(
        &self,
        image: PageImage,
        options: &RecognitionOptions,
        page_index: u32,
        total_pages: u32,
        tracker: &ProgressTracker<'_>,
    ) -> Result<String> {
        let message = if total_pages > 1 {
            format!(
                "Recognizing text (page {} of {})...",
                page_index + 1,
                total_pages
            )
        } else {
            "Recognizing text...".to_string()
        };

        tracker.report_page(page_index, total_pages, 0.0, message.as_str());
        let on_tick = |tick: f32| tracker.report_page(page_index, total_pages, tick, message.as_str());
        self.recognizer.recognize(image, options, &on_tick).await
    }
}

fn single_page(page_number: u32, text: &str) -> Vec<PageTranscript> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    vec![PageTranscript {
        page_number,
        text: text.to_string(),
    }]
}

async fn decode_image(file: &SourceFile) -> Result<PageImage> {
    let bytes = file.shared_bytes();
    tokio::task::spawn_blocking(move || PageImage::decode(&bytes))
        .await
        .map_err(|err| FolioError::ImageError(format!("decode task did not complete: {}", err)))?
}

/// Run `work` to completion, emitting a one-off advisory if it takes longer
/// than `after`. The work is never cancelled.
async fn with_soft_timeout<F, T>(work: F, after: Duration, tracker: &ProgressTracker<'_>) -> T
where
    F: Future<Output = T>,
{
    tokio::pin!(work);
    let advisory = tokio::time::sleep(after);
    tokio::pin!(advisory);
    let mut advised = false;

    loop {
        tokio::select! {
            output = &mut work => return output,
            _ = &mut advisory, if !advised => {
                advised = true;
                warn!(
                    seconds = after.as_secs(),
                    overall = tracker.overall(),
                    "Transcription exceeded soft timeout"
                );
                tracker.advise(MSG_SLOW);
            }
        }
    }
}
