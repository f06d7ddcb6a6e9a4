// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a committed document.
///
/// Assigned by the document index at commit time and never reused, even after
/// the document is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// The two kinds of document Folio understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Stable lowercase tag, used in the index and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }

    /// Content store namespace (sub-directory) holding blobs of this kind.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Pdf => "pdfs",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown document kind '{other}' (expected image or pdf)")),
        }
    }
}

/// Relative key of a blob inside the content store, e.g. `images/3f2a….png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageLocation(String);

impl StorageLocation {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural metadata of a raster image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Number of colour channels of the decoded colour type (L=1 … RGBA=4).
    pub channel_count: u8,
}

/// Structural metadata of a PDF.
///
/// Page geometry is the first page's media box in PDF user-space units
/// (1/72 inch by default), not pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PdfMetadata {
    pub page_count: u32,
    pub first_page_width: f64,
    pub first_page_height: f64,
}

/// Kind-specific metadata payload. The variant determines the document kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Metadata {
    Image(ImageMetadata),
    Pdf(PdfMetadata),
}

impl Metadata {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Self::Image(_) => DocumentKind::Image,
            Self::Pdf(_) => DocumentKind::Pdf,
        }
    }

    pub fn as_image(&self) -> Option<&ImageMetadata> {
        match self {
            Self::Image(meta) => Some(meta),
            Self::Pdf(_) => None,
        }
    }

    pub fn as_pdf(&self) -> Option<&PdfMetadata> {
        match self {
            Self::Pdf(meta) => Some(meta),
            Self::Image(_) => None,
        }
    }
}

/// A fully resolved record ready to be committed to the index.
///
/// There is no way to build one without metadata, so the index never sees a
/// half-populated row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub title: String,
    pub storage_location: StorageLocation,
    pub metadata: Metadata,
    /// SHA-256 hex digest of the stored bytes.
    pub content_sha256: String,
    pub byte_size: u64,
}

impl NewDocument {
    pub fn kind(&self) -> DocumentKind {
        self.metadata.kind()
    }
}

/// A committed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub storage_location: StorageLocation,
    pub uploaded_at: DateTime<Utc>,
    pub metadata: Metadata,
    pub content_sha256: String,
    pub byte_size: u64,
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        self.metadata.kind()
    }
}

/// Offset/limit window into a recency-ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(offset: u64, limit: u32) -> Self {
        Self { offset, limit }
    }

    /// First page of the given size.
    pub fn first(limit: u32) -> Self {
        Self { offset: 0, limit }
    }
}

/// One page of a listing. `next_offset` is `None` once the listing is exhausted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_offset: Option<u64>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_offset: self.next_offset,
            total: self.total,
        }
    }
}
