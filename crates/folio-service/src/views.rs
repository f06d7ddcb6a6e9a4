// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request and response shapes for the request boundary.
//
// Display fields (URL, MIME type, author, creation date, file size) are
// derived here at read time and never stored in the index.

use chrono::{DateTime, Utc};
use folio_core::FolioConfig;
use folio_core::types::{Document, DocumentId, DocumentKind, Metadata, Page};
use folio_document::DocumentDetails;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// New upload. `file` carries the document as base64 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(alias = "file_type")]
    pub kind: DocumentKind,
    pub title: String,
    pub file: String,
}

/// Rotate a stored image clockwise by `angle` degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotateRequest {
    pub image_id: DocumentId,
    pub angle: f64,
}

/// Render one page of a stored PDF. Without `dpi` the configured default is
/// used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterizeRequest {
    pub pdf_id: DocumentId,
    pub page_number: u32,
    #[serde(default)]
    pub dpi: Option<u32>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Public view of a document, used in listings and as the result of uploads
/// and transformations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    pub id: DocumentId,
    pub title: String,
    pub file_url: String,
    /// Flattened with its `kind` tag: `"kind": "image", "width": ...`.
    #[serde(flatten)]
    pub metadata: Metadata,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentView {
    pub fn new(document: &Document, config: &FolioConfig) -> Self {
        Self {
            id: document.id,
            title: document.title.clone(),
            file_url: config.file_url(document.storage_location.as_str()),
            metadata: document.metadata,
            uploaded_at: document.uploaded_at,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.metadata.kind()
    }
}

/// Full view of one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: DocumentView,
    /// Size of the stored blob; `None` when the blob cannot be read.
    pub file_size: Option<u64>,
    #[serde(flatten)]
    pub extra: DetailExtra,
}

/// Kind-specific read-time details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DetailExtra {
    Image {
        mime_type: String,
    },
    Pdf {
        author: Option<String>,
        creation_date: Option<String>,
    },
}

impl From<DocumentDetails> for DetailExtra {
    fn from(details: DocumentDetails) -> Self {
        match details {
            DocumentDetails::Image { mime_type } => Self::Image { mime_type },
            DocumentDetails::Pdf {
                author,
                creation_date,
            } => Self::Pdf {
                author,
                creation_date,
            },
        }
    }
}

/// One page of a listing.
pub type ListPage = Page<DocumentView>;
