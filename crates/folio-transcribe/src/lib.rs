// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-transcribe — Asynchronous transcription pipeline for Folio.
//
// Decides, per uploaded file, which text-acquisition strategy to try and in
// what order, aggregates progress across stages, caches per-page transcripts
// for a viewing session, and talks to the optional processing server.

pub mod engines;
pub mod orchestrator;
pub mod progress;
pub mod server;
pub mod session;
pub mod store;
pub mod strategy;
pub mod traits;

#[cfg(test)]
mod testing;

pub use engines::{LocalRasterizer, LocalTextLayer, UnavailableRecognizer};
pub use orchestrator::Orchestrator;
pub use progress::ProgressTracker;
pub use server::HttpServerProcessor;
pub use session::DocumentSession;
pub use store::MemoryTranscriptStore;
pub use traits::{
    PageRasterizer, ProgressSink, Recognizer, ServerProcessor, TextLayer, TickSink, TranscriptStore,
};

#[cfg(feature = "ocr")]
pub use engines::OcrsRecognizer;
