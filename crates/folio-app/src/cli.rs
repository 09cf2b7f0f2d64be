// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line parser and command implementations.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use folio_core::error::{FolioError, Result};
use folio_core::types::{
    DocumentId, MediaType, PageTranscript, ProgressEvent, RecognitionOptions, SourceFile,
    StoredTranscript, TranscriptMethod, TranscriptResult,
};
use folio_document::format_transcript;
use folio_transcribe::{DocumentSession, TranscriptStore};
use serde::Serialize;
use tracing::info;

use crate::services::app_services::AppServices;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Turn PDFs and page images into plain-text transcripts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe a document (the first pages, up to the page cap)
    Transcribe {
        /// PDF or image file
        file: PathBuf,
        #[command(flatten)]
        recognition: RecognitionArgs,
        #[command(flatten)]
        overrides: ConfigArgs,
        /// Save the transcript to the data directory
        #[arg(long)]
        save: bool,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transcribe a single page of a document
    Page {
        /// PDF or image file
        file: PathBuf,
        /// 1-indexed page number (out-of-range numbers show page 1)
        page: u32,
        #[command(flatten)]
        recognition: RecognitionArgs,
    },

    /// Print a saved transcript
    Show {
        /// Document id printed by `transcribe --save`
        id: String,
        /// Print the stored record as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
struct RecognitionArgs {
    /// Tune recognition for handwriting
    #[arg(long)]
    handwriting: bool,
    /// Favour speed over accuracy
    #[arg(long)]
    quick: bool,
    /// Skip image preprocessing before recognition
    #[arg(long)]
    no_enhance: bool,
    /// Recognition language code
    #[arg(long)]
    lang: Option<String>,
}

impl RecognitionArgs {
    fn options(&self, default_language: &str) -> RecognitionOptions {
        RecognitionOptions {
            optimize_for_handwriting: self.handwriting,
            enhance_contrast: !self.no_enhance,
            language: self
                .lang
                .clone()
                .unwrap_or_else(|| default_language.to_string()),
            quick_mode: self.quick,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Base URL of a processing server used when local methods find nothing
    #[arg(long, env = "FOLIO_SERVER_URL")]
    server_url: Option<String>,
    /// Maximum number of pages to transcribe
    #[arg(long)]
    page_cap: Option<u32>,
}

/// What a command wants printed on stdout.
pub struct Outcome {
    pub stdout: String,
}

/// Parse-independent entry point, so tests can drive commands directly.
pub async fn run(cli: Cli, mut services: AppServices) -> Result<Outcome> {
    match cli.command {
        Commands::Transcribe {
            file,
            recognition,
            overrides,
            save,
            json,
        } => {
            if let Some(url) = overrides.server_url {
                services.config_mut().server_url = Some(url);
            }
            if let Some(cap) = overrides.page_cap {
                services.config_mut().page_cap = cap;
            }
            transcribe(&services, &file, &recognition, save, json).await
        }
        Commands::Page {
            file,
            page,
            recognition,
        } => page_command(&services, &file, page, &recognition).await,
        Commands::Show { id, json } => show(&services, &id, json).await,
    }
}

// -- Commands ------------------------------------------------------------------

#[derive(Serialize)]
struct TranscriptOutput<'a> {
    document_id: &'a DocumentId,
    name: &'a str,
    text: &'a str,
    method: TranscriptMethod,
    total_pages: u32,
    truncated: bool,
    pages: &'a [PageTranscript],
}

async fn transcribe(
    services: &AppServices,
    path: &Path,
    recognition: &RecognitionArgs,
    save: bool,
    json: bool,
) -> Result<Outcome> {
    let file = read_source(path).await?;
    let options = recognition.options(&services.config().default_language);
    let session = DocumentSession::new(Arc::new(services.orchestrator()?), file, options);

    let printer = ProgressPrinter::default();
    let result: TranscriptResult = session.transcribe(&|event| printer.print(&event)).await?;
    let text = format_transcript(&result.text);

    if result.truncated {
        eprintln!(
            "Only the first {} of {} pages were transcribed.",
            services.config().page_cap.max(1),
            result.total_pages
        );
    }

    let document_id = session.document_id();
    if save {
        let record = StoredTranscript {
            document_id: document_id.clone(),
            document_name: session.file().name().to_string(),
            text: text.clone(),
            method: result.method,
            saved_at: Utc::now(),
        };
        services.store().save(&record).await?;
        eprintln!(
            "Saved as {document_id} in {}",
            services.store().dir().display()
        );
    }

    let stdout = if json {
        let pages: Vec<PageTranscript> = result
            .pages
            .iter()
            .map(|page| PageTranscript {
                page_number: page.page_number,
                text: format_transcript(&page.text),
            })
            .collect();
        serde_json::to_string_pretty(&TranscriptOutput {
            document_id: &document_id,
            name: session.file().name(),
            text: &text,
            method: result.method,
            total_pages: result.total_pages,
            truncated: result.truncated,
            pages: &pages,
        })?
    } else {
        text
    };

    info!(method = %result.method, pages = result.total_pages, "Transcription finished");
    Ok(Outcome { stdout })
}

async fn page_command(
    services: &AppServices,
    path: &Path,
    page: u32,
    recognition: &RecognitionArgs,
) -> Result<Outcome> {
    let file = read_source(path).await?;
    let options = recognition.options(&services.config().default_language);
    let session = DocumentSession::new(Arc::new(services.orchestrator()?), file, options);

    let printer = ProgressPrinter::default();
    let transcript = session.page(page, &|event| printer.print(&event)).await?;
    eprintln!(
        "Page {} of {}",
        transcript.page_number,
        session.page_count().await
    );

    Ok(Outcome {
        stdout: format_transcript(&transcript.text),
    })
}

async fn show(services: &AppServices, id: &str, json: bool) -> Result<Outcome> {
    let document_id = DocumentId::parse(id)
        .ok_or_else(|| FolioError::Storage(format!("`{id}` is not a document id")))?;

    let record = services
        .store()
        .load(&document_id)
        .await?
        .ok_or_else(|| FolioError::Storage(format!("no saved transcript for {document_id}")))?;

    let stdout = if json {
        serde_json::to_string_pretty(&record)?
    } else {
        record.text
    };
    Ok(Outcome { stdout })
}

// -- Helpers -------------------------------------------------------------------

async fn read_source(path: &Path) -> Result<SourceFile> {
    let bytes = tokio::fs::read(path).await?;
    let media_type = detect_media_type(path, &bytes);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceFile::new(bytes, media_type, name))
}

/// Media type from the file extension, then from the leading bytes.
fn detect_media_type(path: &Path, bytes: &[u8]) -> MediaType {
    if let Some(media) = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(MediaType::from_extension)
    {
        return media;
    }

    const SIGNATURES: &[(&[u8], MediaType)] = &[
        (b"%PDF-", MediaType::Pdf),
        (b"\x89PNG\r\n\x1a\n", MediaType::Png),
        (b"\xff\xd8\xff", MediaType::Jpeg),
        (b"II*\0", MediaType::Tiff),
        (b"MM\0*", MediaType::Tiff),
        (b"GIF8", MediaType::Gif),
        (b"BM", MediaType::Bmp),
    ];
    for (magic, media) in SIGNATURES {
        if bytes.starts_with(magic) {
            return media.clone();
        }
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return MediaType::Webp;
    }
    MediaType::Other("application/octet-stream".into())
}

/// Writes progress to stderr, skipping repeats of the same line.
#[derive(Default)]
struct ProgressPrinter {
    last: Mutex<Option<(u32, String)>>,
}

impl ProgressPrinter {
    fn print(&self, event: &ProgressEvent) {
        let percent = (event.overall * 100.0).round() as u32;
        let Some(line) = self.next_line(percent, &event.message) else {
            return;
        };
        eprintln!("{line}");
    }

    fn next_line(&self, percent: u32, message: &str) -> Option<String> {
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((last_percent, last_message)) = last.as_ref()
            && *last_percent == percent
            && last_message == message
        {
            return None;
        }
        *last = Some((percent, message.to_string()));
        Some(format!("[{percent:>3}%] {message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::error::ExhaustionReason;
    use lopdf::{Document, Object, Stream, dictionary};

    /// One text page per entry.
    fn text_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn services(dir: &Path) -> AppServices {
        AppServices::at(dir.to_path_buf()).unwrap()
    }

    #[test]
    fn parses_transcribe_flags() {
        let cli = Cli::try_parse_from([
            "folio",
            "transcribe",
            "scan.png",
            "--handwriting",
            "--no-enhance",
            "--lang",
            "deu",
            "--page-cap",
            "5",
            "--save",
        ])
        .unwrap();

        match cli.command {
            Commands::Transcribe {
                file,
                recognition,
                overrides,
                save,
                json,
            } => {
                assert_eq!(file, PathBuf::from("scan.png"));
                let options = recognition.options("eng");
                assert!(options.optimize_for_handwriting);
                assert!(!options.enhance_contrast);
                assert!(!options.quick_mode);
                assert_eq!(options.language, "deu");
                assert_eq!(overrides.page_cap, Some(5));
                assert!(save);
                assert!(!json);
            }
            _ => panic!("expected transcribe"),
        }
    }

    #[test]
    fn language_defaults_from_config() {
        let cli = Cli::try_parse_from(["folio", "page", "doc.pdf", "2", "--quick"]).unwrap();
        match cli.command {
            Commands::Page {
                page, recognition, ..
            } => {
                assert_eq!(page, 2);
                let options = recognition.options("fra");
                assert_eq!(options.language, "fra");
                assert!(options.quick_mode);
                assert!(options.enhance_contrast);
            }
            _ => panic!("expected page"),
        }
    }

    #[test]
    fn media_type_detection() {
        assert_eq!(detect_media_type(Path::new("a.PDF"), b""), MediaType::Pdf);
        assert_eq!(detect_media_type(Path::new("upload"), b"%PDF-1.7"), MediaType::Pdf);
        assert_eq!(
            detect_media_type(Path::new("upload"), b"\x89PNG\r\n\x1a\nrest"),
            MediaType::Png
        );
        assert_eq!(
            detect_media_type(Path::new("upload"), b"RIFF\0\0\0\0WEBPVP8 "),
            MediaType::Webp
        );
        assert_eq!(
            detect_media_type(Path::new("notes.txt"), b"hello"),
            MediaType::Other("application/octet-stream".into())
        );
    }

    #[test]
    fn progress_printer_skips_repeats() {
        let printer = ProgressPrinter::default();
        assert_eq!(
            printer.next_line(20, "Extracting text...").as_deref(),
            Some("[ 20%] Extracting text...")
        );
        assert!(printer.next_line(20, "Extracting text...").is_none());
        assert!(printer.next_line(20, "Trying fallback...").is_some());
    }

    #[tokio::test]
    async fn transcribe_text_pdf_and_show_saved_copy() {
        let data = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let pdf = docs.path().join("minutes.pdf");
        std::fs::write(&pdf, text_pdf(&["Meeting opened at noon.", "Budget approved."])).unwrap();

        let cli = Cli::try_parse_from([
            "folio",
            "transcribe",
            pdf.to_str().unwrap(),
            "--save",
            "--json",
        ])
        .unwrap();
        let outcome = run(cli, services(data.path())).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&outcome.stdout).unwrap();

        assert_eq!(value["method"], "extracted");
        assert_eq!(value["total_pages"], 2);
        assert_eq!(value["truncated"], false);
        let text = value["text"].as_str().unwrap();
        assert!(text.contains("Meeting opened at noon."));
        assert!(text.contains("Budget approved."));

        let id = value["document_id"].as_str().unwrap().to_string();
        let cli = Cli::try_parse_from(["folio", "show", id.as_str()]).unwrap();
        let shown = run(cli, services(data.path())).await.unwrap();
        assert_eq!(shown.stdout, text);
    }

    #[tokio::test]
    async fn page_command_reads_one_page() {
        let data = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let pdf = docs.path().join("report.pdf");
        std::fs::write(
            &pdf,
            text_pdf(&["Summary of findings", "Appendix with tables"]),
        )
        .unwrap();

        let cli = Cli::try_parse_from(["folio", "page", pdf.to_str().unwrap(), "2"]).unwrap();
        let outcome = run(cli, services(data.path())).await.unwrap();
        assert!(outcome.stdout.contains("Appendix with tables"));
        assert!(!outcome.stdout.contains("Summary"));
    }

    #[tokio::test]
    async fn page_cap_override_truncates() {
        let data = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let pdf = docs.path().join("long.pdf");
        std::fs::write(
            &pdf,
            text_pdf(&["Chapter one text", "Chapter two text", "Chapter three text"]),
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "folio",
            "transcribe",
            pdf.to_str().unwrap(),
            "--page-cap",
            "1",
            "--json",
        ])
        .unwrap();
        let outcome = run(cli, services(data.path())).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&outcome.stdout).unwrap();
        assert_eq!(value["truncated"], true);
        assert_eq!(value["total_pages"], 3);
        assert_eq!(value["pages"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn show_rejects_bad_id_and_unknown_document() {
        let data = tempfile::tempdir().unwrap();

        let cli = Cli::try_parse_from(["folio", "show", "not-an-id"]).unwrap();
        assert!(matches!(
            run(cli, services(data.path())).await,
            Err(FolioError::Storage(_))
        ));

        let unknown = DocumentId::from_bytes(b"never saved");
        let cli = Cli::try_parse_from(["folio", "show", unknown.as_str()]).unwrap();
        assert!(matches!(
            run(cli, services(data.path())).await,
            Err(FolioError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn undecodable_image_has_no_extractable_text() {
        let data = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let path = docs.path().join("broken.bmp");
        std::fs::write(&path, b"BM").unwrap();

        let cli = Cli::try_parse_from(["folio", "transcribe", path.to_str().unwrap()]).unwrap();
        assert!(matches!(
            run(cli, services(data.path())).await,
            Err(FolioError::Exhausted(ExhaustionReason::NoExtractableText))
        ));
    }

    #[tokio::test]
    async fn corrupt_pdf_has_no_extractable_text() {
        let data = tempfile::tempdir().unwrap();
        let docs = tempfile::tempdir().unwrap();
        let path = docs.path().join("torn.pdf");
        std::fs::write(&path, b"this was never a PDF").unwrap();

        let cli = Cli::try_parse_from(["folio", "transcribe", path.to_str().unwrap()]).unwrap();
        assert!(matches!(
            run(cli, services(data.path())).await,
            Err(FolioError::Exhausted(ExhaustionReason::NoExtractableText))
        ));
    }
}
