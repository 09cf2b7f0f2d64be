// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Saved transcripts as JSON files, one per document, named by document id.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use folio_core::error::{FolioError, Result};
use folio_core::types::{DocumentId, StoredTranscript};
use folio_transcribe::TranscriptStore;
use tracing::{debug, info, warn};

pub struct JsonTranscriptStore {
    dir: PathBuf,
}

impl JsonTranscriptStore {
    /// Store rooted at `dir`, which must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &DocumentId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }
}

#[async_trait]
impl TranscriptStore for JsonTranscriptStore {
    async fn save(&self, record: &StoredTranscript) -> Result<()> {
        let path = self.path_for(&record.document_id);
        let staging = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(record)?;

        tokio::fs::write(&staging, json).await?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                warn!(path = %staging.display(), error = %cleanup, "Could not remove staging file");
            }
            return Err(e.into());
        }

        info!(id = %record.document_id, path = %path.display(), "Transcript saved");
        Ok(())
    }

    async fn load(&self, id: &DocumentId) -> Result<Option<StoredTranscript>> {
        let path = self.path_for(id);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(id = %id, "No saved transcript");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_slice(&data).map_err(|e| {
            FolioError::Storage(format!("{} is not a transcript record: {e}", path.display()))
        })?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_core::types::TranscriptMethod;

    fn record(text: &str) -> StoredTranscript {
        StoredTranscript {
            document_id: DocumentId::from_bytes(b"field notes"),
            document_name: "notes.png".into(),
            text: text.into(),
            method: TranscriptMethod::Ocr,
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTranscriptStore::new(dir.path());
        let saved = record("Observed three herons.");

        store.save(&saved).await.unwrap();
        let file = dir.path().join(format!("{}.json", saved.document_id.as_str()));
        assert!(file.is_file());

        let loaded = store.load(&saved.document_id).await.unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[tokio::test]
    async fn missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTranscriptStore::new(dir.path());
        let loaded = store.load(&DocumentId::from_bytes(b"nothing")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn overwrite_keeps_latest() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTranscriptStore::new(dir.path());
        store.save(&record("draft")).await.unwrap();
        store.save(&record("final")).await.unwrap();

        let id = DocumentId::from_bytes(b"field notes");
        assert_eq!(store.load(&id).await.unwrap().unwrap().text, "final");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn failed_rename_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTranscriptStore::new(dir.path());
        let saved = record("blocked");
        // A non-empty directory at the target path makes the rename fail.
        let target = dir.path().join(format!("{}.json", saved.document_id.as_str()));
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupant"), b"x").unwrap();

        assert!(store.save(&saved).await.is_err());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|name| !name.ends_with(".tmp")), "{names:?}");
    }

    #[tokio::test]
    async fn corrupt_record_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTranscriptStore::new(dir.path());
        let id = DocumentId::from_bytes(b"broken");
        std::fs::write(dir.path().join(format!("{}.json", id.as_str())), b"{not json").unwrap();

        let err = store.load(&id).await.unwrap_err();
        assert!(matches!(err, FolioError::Storage(_)));
    }
}
