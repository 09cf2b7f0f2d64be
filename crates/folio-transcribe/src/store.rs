// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

use std::collections::HashMap;

use async_trait::async_trait;
use folio_core::error::Result;
use folio_core::types::{DocumentId, StoredTranscript};
use tokio::sync::RwLock;

use crate::traits::TranscriptStore;

/// Process-local transcript store. Saving a document again replaces its
/// previous record.
#[derive(Default)]
pub struct MemoryTranscriptStore {
    records: RwLock<HashMap<DocumentId, StoredTranscript>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn save(&self, record: &StoredTranscript) -> Result<()> {
        self.records
            .write()
            .await
            .insert(record.document_id.clone(), record.clone());
        Ok(())
    }

    async fn load(&self, id: &DocumentId) -> Result<Option<StoredTranscript>> {
        Ok(self.records.read().await.get(id).cloned())
    }
}
