// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress aggregation — maps stage-local progress onto a weighted
// document-level percentage and forwards events to the caller.

use std::sync::Mutex;

use folio_core::types::{ProgressEvent, ProgressStage};

use crate::traits::ProgressSink;

/// Share of overall progress owned by each stage, as `(start, end)`.
pub fn stage_span(stage: ProgressStage) -> (f32, f32) {
    match stage {
        ProgressStage::PdfConversion => (0.0, 0.2),
        ProgressStage::Preprocessing => (0.2, 0.3),
        ProgressStage::Ocr => (0.3, 1.0),
        ProgressStage::Complete => (1.0, 1.0),
    }
}

/// Document-level completion for a stage-local value.
pub fn overall_for(stage: ProgressStage, progress: f32) -> f32 {
    let (start, end) = stage_span(stage);
    start + (end - start) * clamp_unit(progress)
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
struct Last {
    stage: ProgressStage,
    progress: f32,
    overall: f32,
}

/// Emits [`ProgressEvent`]s for one orchestration run.
///
/// `overall` never decreases between two [`reset`](Self::reset)s; the chain
/// resets at the start of every strategy attempt.
pub struct ProgressTracker<'a> {
    sink: &'a ProgressSink<'a>,
    last: Mutex<Last>,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(sink: &'a ProgressSink<'a>) -> Self {
        Self {
            sink,
            last: Mutex::new(Last {
                stage: ProgressStage::PdfConversion,
                progress: 0.0,
                overall: 0.0,
            }),
        }
    }

    /// Start a new strategy attempt from zero.
    pub fn reset(&self) {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        last.progress = 0.0;
        last.overall = 0.0;
    }

    /// Report stage-local `progress` with a message.
    pub fn report(&self, stage: ProgressStage, progress: f32, message: impl Into<String>) {
        let progress = clamp_unit(progress);
        self.emit(stage, progress, overall_for(stage, progress), message.into());
    }

    /// Report recognition of page `page_index` (0-based) of `total_pages`,
    /// `per_page` of the way through that page.
    pub fn report_page(
        &self,
        page_index: u32,
        total_pages: u32,
        per_page: f32,
        message: impl Into<String>,
    ) {
        let total = total_pages.max(1) as f32;
        let progress = clamp_unit((page_index as f32 + clamp_unit(per_page)) / total);
        self.report(ProgressStage::Ocr, progress, message);
    }

    pub fn complete(&self, message: impl Into<String>) {
        self.report(ProgressStage::Complete, 1.0, message);
    }

    /// Re-emit the latest position with a different message.
    pub fn advise(&self, message: impl Into<String>) {
        let last = self.snapshot();
        (self.sink)(ProgressEvent {
            stage: last.stage,
            progress: last.progress,
            overall: last.overall,
            message: message.into(),
        });
    }

    /// Latest emitted overall completion.
    pub fn overall(&self) -> f32 {
        self.snapshot().overall
    }

    fn snapshot(&self) -> Last {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn emit(&self, stage: ProgressStage, progress: f32, overall: f32, message: String) {
        let event = {
            let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            last.stage = stage;
            last.progress = progress;
            last.overall = last.overall.max(overall);
            ProgressEvent {
                stage,
                progress,
                overall: last.overall,
                message,
            }
        };
        (self.sink)(event);
    }
}
