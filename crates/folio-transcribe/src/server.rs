// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP client for the remote processing service.

use std::time::Duration;

use async_trait::async_trait;
use folio_core::error::{FolioError, Result};
use folio_core::types::{ServerTranscript, SourceFile};
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument, warn};

use crate::traits::ServerProcessor;

/// Posts the original file to `{base_url}/api/process` and reads back
/// `{ "text": ..., "method": "extracted" | "ocr" }`.
pub struct HttpServerProcessor {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpServerProcessor {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FolioError::ServerProcessing(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/api/process", self.base_url)
    }

    fn transport_error(&self, err: reqwest::Error) -> FolioError {
        if err.is_connect() {
            FolioError::ServerProcessing(format!("cannot reach {}", self.base_url))
        } else if err.is_timeout() {
            FolioError::ServerProcessing(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            FolioError::ServerProcessing(err.to_string())
        }
    }
}

#[async_trait]
impl ServerProcessor for HttpServerProcessor {
    #[instrument(skip_all, fields(url = %self.endpoint(), name = file.name(), bytes_len = file.len()))]
    async fn process(&self, file: &SourceFile) -> Result<ServerTranscript> {
        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(file.media_type().mime_type())
            .map_err(|e| FolioError::ServerProcessing(format!("invalid media type: {e}")))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Processing server refused the file");
            return Err(FolioError::ServerProcessing(format!(
                "server returned {status}: {}",
                body.trim()
            )));
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        let reply: ServerTranscript = serde_json::from_slice(&body)
            .map_err(|e| FolioError::ServerProcessing(format!("unreadable reply: {e}")))?;

        debug!(method = %reply.method, chars = reply.text.len(), "Processing server replied");
        Ok(reply)
    }
}
