// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio transcription engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Content-derived identifier for a document: lowercase hex SHA-256 of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Hash raw document bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        Self(hex::encode(digest))
    }

    /// Accept a previously issued identifier (64 hex characters).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        if value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier for one viewing session over a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declared media type of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Webp,
    Bmp,
    Gif,
    /// Anything else, kept verbatim.
    Other(String),
}

impl MediaType {
    /// MIME type string.
    pub fn mime_type(&self) -> &str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Tiff => "image/tiff",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Gif => "image/gif",
            Self::Other(mime) => mime,
        }
    }

    /// Parse a MIME type string (parameters such as `; charset=` are ignored).
    pub fn from_mime(mime: &str) -> Self {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => Self::Pdf,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            "image/png" => Self::Png,
            "image/tiff" | "image/tif" => Self::Tiff,
            "image/webp" => Self::Webp,
            "image/bmp" | "image/x-ms-bmp" => Self::Bmp,
            "image/gif" => Self::Gif,
            _ => Self::Other(essence),
        }
    }

    /// Infer the media type from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Fixed, enumerable pages with an optional text layer.
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Pdf)
    }

    /// A single raster image.
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            Self::Jpeg | Self::Png | Self::Tiff | Self::Webp | Self::Bmp | Self::Gif
        )
    }
}

/// An uploaded document: raw bytes plus declared media type.
///
/// Immutable once received. Cloning shares the byte buffer.
#[derive(Debug, Clone)]
pub struct SourceFile {
    bytes: Arc<[u8]>,
    media_type: MediaType,
    name: String,
}

impl SourceFile {
    pub fn new(bytes: impl Into<Arc<[u8]>>, media_type: MediaType, name: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type,
            name: name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the bytes, for moving into blocking tasks.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn document_id(&self) -> DocumentId {
        DocumentId::from_bytes(&self.bytes)
    }
}

/// Inclusive, 1-indexed page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    /// Pages `1..=count`.
    pub fn first(count: u32) -> Self {
        Self {
            start: 1,
            end: count,
        }
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start.max(1)..=self.end
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_add(1).saturating_sub(self.start.max(1))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Caller-supplied recognition preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionOptions {
    pub optimize_for_handwriting: bool,
    pub enhance_contrast: bool,
    pub language: String,
    pub quick_mode: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            optimize_for_handwriting: false,
            enhance_contrast: true,
            language: "eng".into(),
            quick_mode: false,
        }
    }
}

/// Quality/speed trade-off for image preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreprocessQuality {
    Low,
    Medium,
    High,
}

impl PreprocessQuality {
    /// Quick mode favours speed; handwriting favours fidelity.
    pub fn for_options(options: &RecognitionOptions) -> Self {
        if options.quick_mode {
            Self::Low
        } else if options.optimize_for_handwriting {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// Pipeline stage reported in progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStage {
    PdfConversion,
    Preprocessing,
    Ocr,
    Complete,
}

/// One progress notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    /// Completion of the current stage, in [0, 1].
    pub progress: f32,
    /// Weighted document-level completion, in [0, 1].
    pub overall: f32,
    pub message: String,
}

/// How a transcript was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptMethod {
    Extracted,
    Ocr,
}

impl std::fmt::Display for TranscriptMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extracted => f.write_str("extracted"),
            Self::Ocr => f.write_str("ocr"),
        }
    }
}

/// Text of one page (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTranscript {
    pub page_number: u32,
    pub text: String,
}

/// Final output of one transcription run. `text` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub text: String,
    pub method: TranscriptMethod,
    pub total_pages: u32,
    pub truncated: bool,
    /// Pages that contributed to `text`, in page order.
    pub pages: Vec<PageTranscript>,
}

/// Reply from the remote processing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTranscript {
    pub text: String,
    pub method: TranscriptMethod,
}

/// Transcript record handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTranscript {
    pub document_id: DocumentId,
    pub document_name: String,
    pub text: String,
    pub method: TranscriptMethod,
    pub saved_at: DateTime<Utc>,
}
