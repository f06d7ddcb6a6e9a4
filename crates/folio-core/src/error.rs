// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.
//
// Each layer has its own enum (document processing, content store, index);
// `IngestionError` is what callers of the pipeline and transformers see.

use thiserror::Error;

use crate::types::DocumentId;

/// Metadata extraction failure. Extraction never touches stored state, so the
/// caller decides what to clean up.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed PDF document: {0}")]
    MalformedDocument(String),
}

/// Failures inside the image/PDF processing layer.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("page rendering failed: {0}")]
    Render(String),
}

/// Content store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write blob {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read blob {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete blob {location}: {source}")]
    Delete {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage location: {0}")]
    InvalidLocation(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
}

impl StoreError {
    /// Whether the failure means the blob simply is not there.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Document index failures.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("database error: {0}")]
    Database(String),

    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("corrupt index row {id}: {reason}")]
    CorruptRow { id: i64, reason: String },

    #[error("index connection lock poisoned")]
    Poisoned,
}

/// Top-level error for ingestion, transformation, and retrieval operations.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage write failed: {0}")]
    StorageWriteFailed(#[source] StoreError),

    #[error("storage read failed: {0}")]
    StorageReadFailed(#[source] StoreError),

    #[error("metadata extraction failed: {0}")]
    MetadataExtractionFailed(#[from] ExtractionError),

    #[error("index commit failed: {0}")]
    IndexCommitFailed(#[source] IndexError),

    #[error("index error: {0}")]
    Index(#[source] IndexError),

    #[error("source document {0} not found")]
    SourceNotFound(DocumentId),

    #[error("document {0} not found")]
    NotFound(DocumentId),

    #[error("page {page_number} out of range (document has {page_count} pages)")]
    PageOutOfRange { page_number: u32, page_count: u32 },

    #[error("rendering failed: {0}")]
    RenderFailed(String),

    #[error("transformation failed: {0}")]
    TransformFailed(String),
}

impl From<IndexError> for IngestionError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NotFound(id) => Self::NotFound(id),
            other => Self::Index(other),
        }
    }
}

/// Failures while bringing the service up: configuration, store, index.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot read config {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    ConfigParse { path: String, message: String },

    #[error("cannot write config {path}: {source}")]
    ConfigWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("content store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("document index unavailable: {0}")]
    Index(#[from] IndexError),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, IngestionError>;
