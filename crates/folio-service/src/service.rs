// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document service: the facade front ends call.
//
// Everything inside is Arc-wrapped, so the service is cheap to clone and can
// be shared across threads. No lock is held across a whole request; the index
// serialises single statements on its own connection mutex.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use folio_core::FolioConfig;
use folio_core::error::{IngestionError, Result, SetupError, StoreError};
use folio_core::types::{Document, DocumentId, DocumentKind, PageRequest, StorageLocation};
use folio_document::{PageRenderer, inspect};
use folio_storage::{ContentStore, DocumentIndex, LocalContentStore, verify_hash};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::pipeline::IngestionPipeline;
use crate::transform::Transformers;
use crate::views::{
    DetailExtra, DocumentDetail, DocumentView, ListPage, RasterizeRequest, RotateRequest,
    UploadRequest,
};

/// Directory under the data directory holding the content store.
pub const MEDIA_DIR: &str = "media";

/// Blobs younger than this are never pruned; they may belong to an ingestion
/// that has not committed yet.
pub const PRUNE_GRACE: Duration = Duration::from_secs(300);

/// Outcome of a delete request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "document", rename_all = "snake_case")]
pub enum Deletion {
    /// The record was removed; its blob was deleted as well.
    Removed(Document),
    /// No record with that id existed (already deleted, or never created).
    AlreadyAbsent,
}

/// Result of re-hashing a stored blob against its recorded digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Intact,
    Tampered { expected: String, actual: String },
    Missing,
}

/// Blobs removed by `prune_orphans`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    pub removed: Vec<StorageLocation>,
    /// Unreferenced blobs left alone because they are too recent.
    pub skipped_recent: usize,
}

/// Shared document services.
#[derive(Clone)]
pub struct DocumentService {
    pipeline: Arc<IngestionPipeline>,
    transformers: Arc<Transformers>,
    config: Arc<FolioConfig>,
}

impl DocumentService {
    /// Open the store and index under `data_dir` with the default renderer.
    #[instrument(skip_all, fields(data_dir = %data_dir.display()))]
    pub fn open(data_dir: &Path, config: FolioConfig) -> std::result::Result<Self, SetupError> {
        let store = LocalContentStore::open(data_dir.join(MEDIA_DIR))?;
        let index = DocumentIndex::open(config.database_path(data_dir))?;
        let renderer = default_renderer(&config);

        info!(renderer = renderer.name(), "document service opened");
        Ok(Self::from_parts(Arc::new(store), Arc::new(index), renderer, config))
    }

    /// Assemble a service from explicit parts (tests, embedding).
    pub fn from_parts(
        store: Arc<dyn ContentStore>,
        index: Arc<DocumentIndex>,
        renderer: Arc<dyn PageRenderer>,
        config: FolioConfig,
    ) -> Self {
        let pipeline = Arc::new(IngestionPipeline::new(store, index, config.max_title_len));
        let transformers = Arc::new(Transformers::new(
            Arc::clone(&pipeline),
            renderer,
            config.max_dpi,
        ));
        Self {
            pipeline,
            transformers,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    fn store(&self) -> &Arc<dyn ContentStore> {
        self.pipeline.store()
    }

    fn index(&self) -> &Arc<DocumentIndex> {
        self.pipeline.index()
    }

    // -- Creation -------------------------------------------------------------

    pub fn upload(&self, request: UploadRequest) -> Result<DocumentView> {
        let document = self
            .pipeline
            .ingest_encoded(request.kind, &request.file, &request.title)?;
        Ok(self.view(&document))
    }

    /// Ingest raw bytes without the base64 transport step.
    pub fn upload_bytes(&self, kind: DocumentKind, bytes: &[u8], title: &str) -> Result<DocumentView> {
        let document = self.pipeline.ingest(kind, bytes, title)?;
        Ok(self.view(&document))
    }

    pub fn rotate(&self, request: RotateRequest) -> Result<DocumentView> {
        let document = self.transformers.rotate(request.image_id, request.angle)?;
        Ok(self.view(&document))
    }

    pub fn rasterize(&self, request: RasterizeRequest) -> Result<DocumentView> {
        let dpi = request.dpi.unwrap_or(self.config.default_dpi);
        let document = self
            .transformers
            .rasterize(request.pdf_id, request.page_number, dpi)?;
        Ok(self.view(&document))
    }

    // -- Retrieval ------------------------------------------------------------

    /// The committed record.
    pub fn get(&self, id: DocumentId) -> Result<Document> {
        Ok(self.index().get(id)?)
    }

    /// Record plus read-time details. A missing or unreadable blob yields
    /// empty details rather than an error.
    #[instrument(skip(self))]
    pub fn detail(&self, id: DocumentId) -> Result<DocumentDetail> {
        let document = self.get(id)?;
        let location = &document.storage_location;

        let file_size = self
            .store()
            .size(location)
            .map_err(|err| warn!(%location, error = %err, "cannot stat blob"))
            .ok();
        let bytes = self
            .store()
            .get(location)
            .map_err(|err| warn!(%location, error = %err, "cannot read blob"))
            .unwrap_or_default();

        Ok(DocumentDetail {
            document: self.view(&document),
            file_size,
            extra: DetailExtra::from(inspect(document.kind(), &bytes)),
        })
    }

    /// Newest-first listing. Page size defaults to and is capped by the
    /// configured limits.
    pub fn list(
        &self,
        kind: Option<DocumentKind>,
        offset: Option<u64>,
        limit: Option<u32>,
    ) -> Result<ListPage> {
        let request = PageRequest::new(offset.unwrap_or(0), self.config.clamp_page_size(limit));
        let page = self.index().list(kind, request)?;
        Ok(page.map(|document| self.view(&document)))
    }

    // -- Deletion -------------------------------------------------------------

    /// Remove the record, then its blob. The record goes first: a blob without
    /// a record is tolerable, a record without a blob is not.
    #[instrument(skip(self))]
    pub fn delete(&self, id: DocumentId) -> Result<Deletion> {
        let Some(document) = self.index().delete(id)? else {
            debug!(document_id = %id, "nothing to delete");
            return Ok(Deletion::AlreadyAbsent);
        };

        if let Err(err) = self.store().delete(&document.storage_location) {
            warn!(
                location = %document.storage_location,
                error = %err,
                "record deleted but blob removal failed"
            );
        }
        info!(document_id = %id, "document deleted");
        Ok(Deletion::Removed(document))
    }

    // -- Maintenance ----------------------------------------------------------

    /// Re-hash the stored blob and compare it with the digest recorded at
    /// commit time.
    #[instrument(skip(self))]
    pub fn verify(&self, id: DocumentId) -> Result<Verification> {
        let document = self.get(id)?;
        let bytes = match self.store().get(&document.storage_location) {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => {
                warn!(document_id = %id, "blob missing");
                return Ok(Verification::Missing);
            }
            Err(err) => return Err(IngestionError::StorageReadFailed(err)),
        };

        match verify_hash(&bytes, &document.content_sha256) {
            Ok(()) => Ok(Verification::Intact),
            Err(StoreError::IntegrityMismatch { expected, actual }) => {
                warn!(document_id = %id, %expected, %actual, "blob does not match recorded digest");
                Ok(Verification::Tampered { expected, actual })
            }
            Err(other) => Err(IngestionError::StorageReadFailed(other)),
        }
    }

    /// Delete blobs no record refers to, e.g. after a crash between blob
    /// write and rollback. Blobs younger than `PRUNE_GRACE` are kept.
    #[instrument(skip(self))]
    pub fn prune_orphans(&self) -> Result<PruneReport> {
        // Blobs are listed before the index is read, so a blob committed in
        // between is seen as referenced.
        let blobs = self
            .store()
            .locations()
            .map_err(IngestionError::StorageReadFailed)?;
        let referenced = self.index().storage_locations()?;
        let cutoff = SystemTime::now()
            .checked_sub(PRUNE_GRACE)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut report = PruneReport::default();
        for location in blobs.into_iter().filter(|loc| !referenced.contains(loc)) {
            let modified = self
                .store()
                .modified(&location)
                .map_err(IngestionError::StorageReadFailed)?;
            if modified > cutoff {
                report.skipped_recent += 1;
                continue;
            }
            self.store()
                .delete(&location)
                .map_err(IngestionError::StorageWriteFailed)?;
            report.removed.push(location);
        }

        info!(
            removed = report.removed.len(),
            skipped = report.skipped_recent,
            "orphan blobs pruned"
        );
        Ok(report)
    }

    fn view(&self, document: &Document) -> DocumentView {
        DocumentView::new(document, &self.config)
    }
}

/// PDFium when compiled in, otherwise a renderer that always fails.
fn default_renderer(config: &FolioConfig) -> Arc<dyn PageRenderer> {
    #[cfg(feature = "pdfium")]
    {
        Arc::new(folio_document::PdfiumRenderer::new(
            config.pdfium_library_path.clone(),
        ))
    }
    #[cfg(not(feature = "pdfium"))]
    {
        let _ = config;
        Arc::new(folio_document::UnavailableRenderer)
    }
}
