// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Counting capability doubles for orchestrator and session tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use folio_core::error::{FolioError, Result};
use folio_core::types::{
    MediaType, PageRange, PageTranscript, ProgressEvent, RecognitionOptions, ServerTranscript,
    SourceFile, TranscriptMethod,
};
use folio_core::TranscribeConfig;
use folio_document::PageImage;
use image::DynamicImage;

use crate::orchestrator::Orchestrator;
use crate::traits::{PageRasterizer, Recognizer, ServerProcessor, TextLayer, TickSink};

pub struct MockTextLayer {
    pub texts: Vec<Option<String>>,
    pub fail: bool,
    pub calls: AtomicUsize,
    pub ranges: Mutex<Vec<PageRange>>,
}

impl MockTextLayer {
    pub fn with_pages(texts: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            texts: texts.iter().map(|t| t.map(str::to_owned)).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        })
    }

    pub fn blank(pages: usize) -> Arc<Self> {
        Self::with_pages(&vec![None; pages])
    }

    pub fn failing(pages: usize) -> Arc<Self> {
        Arc::new(Self {
            texts: vec![None; pages],
            fail: true,
            calls: AtomicUsize::new(0),
            ranges: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextLayer for MockTextLayer {
    async fn page_count(&self, _file: &SourceFile) -> Result<u32> {
        Ok(self.texts.len() as u32)
    }

    async fn extract_pages(
        &self,
        _file: &SourceFile,
        range: PageRange,
    ) -> Result<Vec<PageTranscript>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push(range);
        if self.fail {
            return Err(FolioError::PdfError("corrupt text layer".into()));
        }
        Ok(range
            .pages()
            .filter_map(|page| {
                let text = self.texts.get(page as usize - 1)?.clone()?;
                Some(PageTranscript {
                    page_number: page,
                    text,
                })
            })
            .collect())
    }
}

pub struct MockRasterizer {
    pub total: u32,
    pub rendered: Mutex<Vec<u32>>,
}

impl MockRasterizer {
    pub fn new(total: u32) -> Arc<Self> {
        Arc::new(Self {
            total,
            rendered: Mutex::new(Vec::new()),
        })
    }

    pub fn rendered(&self) -> Vec<u32> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageRasterizer for MockRasterizer {
    async fn render(&self, _file: &SourceFile, page_number: u32, scale: f32) -> Result<PageImage> {
        if page_number == 0 || page_number > self.total {
            return Err(FolioError::InvalidPage {
                page: page_number,
                total: self.total,
            });
        }
        self.rendered.lock().unwrap().push(page_number);
        Ok(PageImage::new(DynamicImage::new_rgb8(16, 16), page_number, scale))
    }
}

/// Answers from a queue, then with `fallback` once the queue is empty.
pub struct MockRecognizer {
    pub queue: Mutex<VecDeque<Result<String>>>,
    pub fallback: String,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
    pub seen_options: Mutex<Vec<RecognitionOptions>>,
    pub seen_pages: Mutex<Vec<u32>>,
}

impl MockRecognizer {
    pub fn answering(fallback: &str) -> Arc<Self> {
        Self::scripted(Vec::new(), fallback)
    }

    pub fn scripted(answers: Vec<Result<String>>, fallback: &str) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(answers.into()),
            fallback: fallback.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
            seen_options: Mutex::new(Vec::new()),
            seen_pages: Mutex::new(Vec::new()),
        })
    }

    pub fn slow(fallback: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
            seen_options: Mutex::new(Vec::new()),
            seen_pages: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for MockRecognizer {
    async fn recognize(
        &self,
        image: PageImage,
        options: &RecognitionOptions,
        on_progress: &TickSink<'_>,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_options.lock().unwrap().push(options.clone());
        self.seen_pages.lock().unwrap().push(image.page_number());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        on_progress(0.5);
        on_progress(1.0);
        let next = self.queue.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

pub struct MockServer {
    pub reply: Option<(String, TranscriptMethod)>,
    pub calls: AtomicUsize,
}

impl MockServer {
    pub fn replying(text: &str, method: TranscriptMethod) -> Arc<Self> {
        Arc::new(Self {
            reply: Some((text.to_string(), method)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServerProcessor for MockServer {
    async fn process(&self, _file: &SourceFile) -> Result<ServerTranscript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some((text, method)) => Ok(ServerTranscript {
                text: text.clone(),
                method: *method,
            }),
            None => Err(FolioError::ServerProcessing("503 Service Unavailable".into())),
        }
    }
}

/// Collects every progress event.
#[derive(Clone, Default)]
pub struct EventLog(pub Arc<Mutex<Vec<ProgressEvent>>>);

impl EventLog {
    pub fn sink(&self) -> impl Fn(ProgressEvent) + Send + Sync + use<> {
        let events = Arc::clone(&self.0);
        move |event| events.lock().unwrap().push(event)
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.0.lock().unwrap().clone()
    }
}

pub fn pdf_file() -> SourceFile {
    SourceFile::new(b"%PDF-1.5 stand-in".to_vec(), MediaType::Pdf, "doc.pdf")
}

pub fn png_file() -> SourceFile {
    let mut bytes = Vec::new();
    DynamicImage::new_rgb8(12, 8)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    SourceFile::new(bytes, MediaType::Png, "scan.png")
}

pub struct Rig {
    pub text_layer: Arc<MockTextLayer>,
    pub rasterizer: Arc<MockRasterizer>,
    pub recognizer: Arc<MockRecognizer>,
    pub server: Option<Arc<MockServer>>,
    pub config: TranscribeConfig,
}

impl Rig {
    pub fn new(text_layer: Arc<MockTextLayer>, recognizer: Arc<MockRecognizer>) -> Self {
        let pages = text_layer.texts.len() as u32;
        Self {
            text_layer,
            rasterizer: MockRasterizer::new(pages.max(1)),
            recognizer,
            server: None,
            config: TranscribeConfig::default(),
        }
    }

    pub fn with_server(mut self, server: Arc<MockServer>) -> Self {
        self.server = Some(server);
        self
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let orchestrator = Orchestrator::new(
            self.rasterizer.clone(),
            self.text_layer.clone(),
            self.recognizer.clone(),
            self.config.clone(),
        );
        match &self.server {
            Some(server) => orchestrator.with_server(server.clone()),
            None => orchestrator,
        }
    }
}
