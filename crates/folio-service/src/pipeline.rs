// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ingestion pipeline: validate, store, extract, commit.
//
// Once bytes have been written, any failure before the index commit deletes
// them again. A caller either gets a committed `Document` or an error with
// nothing left behind.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use folio_core::error::{IngestionError, Result};
use folio_core::types::{Document, DocumentKind, NewDocument, StorageLocation};
use folio_document::extract;
use folio_storage::{ContentStore, DocumentIndex, hash_bytes};
use tracing::{debug, error, info, instrument, warn};

/// Runs single uploads against a content store and a document index.
pub struct IngestionPipeline {
    store: Arc<dyn ContentStore>,
    index: Arc<DocumentIndex>,
    /// Longest accepted title, in characters.
    max_title_len: usize,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn ContentStore>, index: Arc<DocumentIndex>, max_title_len: usize) -> Self {
        Self {
            store,
            index,
            max_title_len,
        }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn index(&self) -> &Arc<DocumentIndex> {
        &self.index
    }

    pub fn max_title_len(&self) -> usize {
        self.max_title_len
    }

    // -- Ingestion ------------------------------------------------------------

    /// Ingest a base64-encoded payload as transported by an upload request.
    /// Undecodable input is rejected before anything is written.
    #[instrument(skip_all, fields(%kind, encoded_len = encoded.len()))]
    pub fn ingest_encoded(&self, kind: DocumentKind, encoded: &str, title: &str) -> Result<Document> {
        let bytes = decode_payload(encoded)?;
        self.ingest(kind, &bytes, title)
    }

    /// Ingest raw bytes.
    #[instrument(skip_all, fields(%kind, bytes_len = bytes.len()))]
    pub fn ingest(&self, kind: DocumentKind, bytes: &[u8], title: &str) -> Result<Document> {
        self.validate_title(title)?;
        if bytes.is_empty() {
            return Err(IngestionError::InvalidEncoding("payload is empty".into()));
        }

        let location = self
            .store
            .put(kind, bytes)
            .map_err(IngestionError::StorageWriteFailed)?;

        let metadata = match extract(kind, bytes) {
            Ok(metadata) => metadata,
            Err(err) => {
                self.roll_back(&location, "metadata extraction failed");
                return Err(err.into());
            }
        };

        let record = NewDocument {
            title: title.to_owned(),
            storage_location: location.clone(),
            metadata,
            content_sha256: hash_bytes(bytes),
            byte_size: bytes.len() as u64,
        };

        match self.index.create(record) {
            Ok(document) => {
                info!(document_id = %document.id, %location, "document ingested");
                Ok(document)
            }
            Err(err) => {
                self.roll_back(&location, "index commit failed");
                Err(IngestionError::IndexCommitFailed(err))
            }
        }
    }

    // -- Helpers --------------------------------------------------------------

    fn validate_title(&self, title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(IngestionError::InvalidRequest("title must not be empty".into()));
        }
        let len = title.chars().count();
        if len > self.max_title_len {
            return Err(IngestionError::InvalidRequest(format!(
                "title is {} characters long (limit {})",
                len, self.max_title_len
            )));
        }
        Ok(())
    }

    /// Delete a blob written by a failed ingestion.
    fn roll_back(&self, location: &StorageLocation, reason: &str) {
        warn!(%location, reason, "rolling back stored blob");
        match self.store.delete(location) {
            Ok(()) => debug!(%location, "rollback complete"),
            Err(err) => error!(%location, error = %err, "rollback failed, blob left orphaned"),
        }
    }
}

/// Decode a base64 upload payload.
///
/// Accepts an optional `data:<mime>;base64,` prefix and ignores ASCII
/// whitespace (line-wrapped encoders). An empty result is rejected.
pub fn decode_payload(encoded: &str) -> Result<Vec<u8>> {
    let body = match encoded.trim_start().strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, body)| body)
            .ok_or_else(|| IngestionError::InvalidEncoding("data URL is not base64".into()))?,
        None => encoded,
    };

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|err| IngestionError::InvalidEncoding(err.to_string()))?;

    if bytes.is_empty() {
        return Err(IngestionError::InvalidEncoding("payload is empty".into()));
    }
    Ok(bytes)
}
