// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document: Document inspection and transformation for Folio.
//
// Provides raster image decoding and rotation, PDF structure reading, page
// rendering behind the `PageRenderer` trait, and the kind-dispatching metadata
// extractor used by the ingestion pipeline.

pub mod extract;
pub mod image;
pub mod pdf;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the primary items so callers can use `folio_document::PdfReader` etc.
pub use extract::{DocumentDetails, extract, inspect};
pub use image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::render::{PageRenderer, UnavailableRenderer, pixel_size};

#[cfg(feature = "pdfium")]
pub use pdf::render::PdfiumRenderer;
