// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Local capability adapters over the synchronous `folio-document` operations.
// CPU-bound work runs on the blocking thread pool.

use async_trait::async_trait;
use folio_core::error::{FolioError, Result};
use folio_core::types::{PageRange, PageTranscript, RecognitionOptions, SourceFile};
use folio_document::{PageImage, TextLayerExtractor};
use tracing::instrument;
#[cfg(feature = "pdfium")]
use tracing::warn;

use crate::traits::{PageRasterizer, Recognizer, TextLayer, TickSink};

fn join_error(task: &str, err: tokio::task::JoinError) -> String {
    format!("{} task did not complete: {}", task, err)
}

/// Rasterises PDF pages in-process.
///
/// With the `pdfium` feature and a loadable PDFium library, pages are fully
/// rendered; otherwise, or when PDFium fails on a page, only the embedded
/// scan is drawn.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRasterizer {
    #[cfg(feature = "pdfium")]
    pdfium: Option<folio_document::PdfiumRasterizer>,
}

impl LocalRasterizer {
    #[cfg(feature = "pdfium")]
    pub fn new() -> Self {
        match folio_document::PdfiumRasterizer::new() {
            Ok(pdfium) => Self {
                pdfium: Some(pdfium),
            },
            Err(err) => {
                warn!(error = %err, "PDFium unavailable; drawing embedded scans only");
                Self { pdfium: None }
            }
        }
    }

    #[cfg(not(feature = "pdfium"))]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(feature = "pdfium")]
    fn render_blocking(self, bytes: &[u8], page_number: u32, scale: f32) -> Result<PageImage> {
        if let Some(pdfium) = self.pdfium {
            match pdfium.render(bytes, page_number, scale) {
                Ok(page) => return Ok(page),
                Err(err @ FolioError::InvalidPage { .. }) => return Err(err),
                Err(err) => {
                    warn!(page_number, error = %err, "PDFium render failed; drawing embedded scan")
                }
            }
        }
        folio_document::PageRasterizer::render(bytes, page_number, scale)
    }

    #[cfg(not(feature = "pdfium"))]
    fn render_blocking(self, bytes: &[u8], page_number: u32, scale: f32) -> Result<PageImage> {
        folio_document::PageRasterizer::render(bytes, page_number, scale)
    }
}

#[async_trait]
impl PageRasterizer for LocalRasterizer {
    #[instrument(skip(self, file), fields(name = file.name()))]
    async fn render(&self, file: &SourceFile, page_number: u32, scale: f32) -> Result<PageImage> {
        let bytes = file.shared_bytes();
        let rasterizer = *self;
        tokio::task::spawn_blocking(move || rasterizer.render_blocking(&bytes, page_number, scale))
            .await
            .map_err(|err| FolioError::Render(join_error("rasteriser", err)))?
    }
}

/// Reads PDF text layers in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTextLayer;

#[async_trait]
impl TextLayer for LocalTextLayer {
    async fn page_count(&self, file: &SourceFile) -> Result<u32> {
        let bytes = file.shared_bytes();
        tokio::task::spawn_blocking(move || TextLayerExtractor::page_count(&bytes))
            .await
            .map_err(|err| FolioError::PdfError(join_error("page count", err)))?
    }

    #[instrument(skip(self, file), fields(name = file.name()))]
    async fn extract_pages(
        &self,
        file: &SourceFile,
        range: PageRange,
    ) -> Result<Vec<PageTranscript>> {
        let bytes = file.shared_bytes();
        tokio::task::spawn_blocking(move || TextLayerExtractor::extract_pages(&bytes, range))
            .await
            .map_err(|err| FolioError::PdfError(join_error("text layer", err)))?
    }
}

/// Stands in for a recognition engine that could not be started.
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Recognizer for UnavailableRecognizer {
    async fn recognize(
        &self,
        _image: PageImage,
        _options: &RecognitionOptions,
        _on_progress: &TickSink<'_>,
    ) -> Result<String> {
        Err(FolioError::EngineUnavailable(self.reason.clone()))
    }
}

#[cfg(feature = "ocr")]
pub use ocrs_recognizer::OcrsRecognizer;

#[cfg(feature = "ocr")]
mod ocrs_recognizer {
    use std::sync::Arc;

    use async_trait::async_trait;
    use folio_core::error::{FolioError, Result};
    use folio_core::types::RecognitionOptions;
    use folio_document::{OcrEngine, PageImage, RecognitionSettings};
    use tokio::sync::mpsc;
    use tracing::instrument;

    use super::join_error;
    use crate::traits::{Recognizer, TickSink};

    /// Recognition with the `ocrs` engine. Models are loaded once, up front.
    #[derive(Clone)]
    pub struct OcrsRecognizer {
        engine: Arc<OcrEngine>,
    }

    impl OcrsRecognizer {
        pub fn new(engine: OcrEngine) -> Self {
            Self {
                engine: Arc::new(engine),
            }
        }
    }

    #[async_trait]
    impl Recognizer for OcrsRecognizer {
        #[instrument(skip_all, fields(page = image.page_number()))]
        async fn recognize(
            &self,
            image: PageImage,
            options: &RecognitionOptions,
            on_progress: &TickSink<'_>,
        ) -> Result<String> {
            let settings = RecognitionSettings::for_options(options);
            let language = options.language.clone();
            let engine = Arc::clone(&self.engine);
            let (tx, mut rx) = mpsc::unbounded_channel::<f32>();

            let task = tokio::task::spawn_blocking(move || {
                engine.recognize(&image, &settings, &language, &mut |tick| {
                    // Receiver gone means the caller stopped listening.
                    let _ = tx.send(tick);
                })
            });

            // The channel closes when the blocking task drops its sender.
            while let Some(tick) = rx.recv().await {
                on_progress(tick);
            }

            task.await
                .map_err(|err| FolioError::Recognition(join_error("recognition", err)))?
        }
    }
}
