// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Derived-document transformers: image rotation and PDF page rasterization.
//
// Each reads an existing document, computes new bytes in memory, and hands
// them to the ingestion pipeline. The source record and blob are only read.

use std::sync::Arc;

use folio_core::error::{IngestionError, Result};
use folio_core::types::{Document, DocumentId, DocumentKind};
use folio_document::{ImageProcessor, PageRenderer};
use tracing::{info, instrument};

use crate::pipeline::IngestionPipeline;

/// Produces new documents from stored ones.
pub struct Transformers {
    pipeline: Arc<IngestionPipeline>,
    renderer: Arc<dyn PageRenderer>,
    max_dpi: u32,
}

impl Transformers {
    pub fn new(pipeline: Arc<IngestionPipeline>, renderer: Arc<dyn PageRenderer>, max_dpi: u32) -> Self {
        Self {
            pipeline,
            renderer,
            max_dpi,
        }
    }

    /// Rotate a stored image clockwise by `angle` degrees and ingest the
    /// result as a new PNG image titled `{title}_rotated_{angle}`.
    #[instrument(skip_all, fields(image_id = %image_id, angle = angle))]
    pub fn rotate(&self, image_id: DocumentId, angle: f64) -> Result<Document> {
        if !angle.is_finite() {
            return Err(IngestionError::InvalidRequest(format!(
                "rotation angle must be a finite number, got {angle}"
            )));
        }

        let source = self.load_source(image_id, DocumentKind::Image)?;
        let bytes = self.read_source(&source)?;

        let rotated = ImageProcessor::from_bytes(&bytes)
            .map_err(|err| IngestionError::TransformFailed(err.to_string()))?
            .rotate(angle)
            .to_png_bytes()
            .map_err(|err| IngestionError::TransformFailed(err.to_string()))?;

        let title = self.derived_title(&source.title, &format!("_rotated_{}", format_angle(angle)));
        let document = self.pipeline.ingest(DocumentKind::Image, &rotated, &title)?;

        info!(source_id = %source.id, document_id = %document.id, "image rotated");
        Ok(document)
    }

    /// Render one page (1-indexed) of a stored PDF at `dpi` and ingest the
    /// bitmap as a new PNG image titled `{title}_page_{page_number}`.
    ///
    /// The page number is checked against the stored page count before the
    /// PDF is read or rendered.
    #[instrument(skip_all, fields(pdf_id = %pdf_id, page_number = page_number, dpi = dpi))]
    pub fn rasterize(&self, pdf_id: DocumentId, page_number: u32, dpi: u32) -> Result<Document> {
        if dpi == 0 || dpi > self.max_dpi {
            return Err(IngestionError::InvalidRequest(format!(
                "dpi must be between 1 and {}, got {}",
                self.max_dpi, dpi
            )));
        }

        let source = self.load_source(pdf_id, DocumentKind::Pdf)?;
        let page_count = source
            .metadata
            .as_pdf()
            .map(|meta| meta.page_count)
            .unwrap_or(0);
        if page_number == 0 || page_number > page_count {
            return Err(IngestionError::PageOutOfRange {
                page_number,
                page_count,
            });
        }

        let bytes = self.read_source(&source)?;
        let page = self
            .renderer
            .render_page(&bytes, page_number, dpi)
            .map_err(|err| IngestionError::RenderFailed(err.to_string()))?;
        if page.width() == 0 || page.height() == 0 {
            return Err(IngestionError::RenderFailed(format!(
                "{} produced an empty image for page {}",
                self.renderer.name(),
                page_number
            )));
        }

        let png = ImageProcessor::from_dynamic(page)
            .to_png_bytes()
            .map_err(|err| IngestionError::TransformFailed(err.to_string()))?;

        let title = self.derived_title(&source.title, &format!("_page_{page_number}"));
        let document = self.pipeline.ingest(DocumentKind::Image, &png, &title)?;

        info!(
            source_id = %source.id,
            document_id = %document.id,
            renderer = self.renderer.name(),
            "PDF page rasterized"
        );
        Ok(document)
    }

    // -- Helpers --------------------------------------------------------------

    /// Look up the source record. A record of the wrong kind counts as absent.
    fn load_source(&self, id: DocumentId, kind: DocumentKind) -> Result<Document> {
        match self.pipeline.index().get(id) {
            Ok(document) if document.kind() == kind => Ok(document),
            Ok(_) => Err(IngestionError::SourceNotFound(id)),
            Err(err) => match IngestionError::from(err) {
                IngestionError::NotFound(id) => Err(IngestionError::SourceNotFound(id)),
                other => Err(other),
            },
        }
    }

    fn read_source(&self, source: &Document) -> Result<Vec<u8>> {
        self.pipeline
            .store()
            .get(&source.storage_location)
            .map_err(IngestionError::StorageReadFailed)
    }

    /// `{title}{suffix}`, shortening the source title so the result stays
    /// within the title limit.
    fn derived_title(&self, title: &str, suffix: &str) -> String {
        let room = self
            .pipeline
            .max_title_len()
            .saturating_sub(suffix.chars().count());
        let stem: String = title.chars().take(room).collect();
        format!("{stem}{suffix}")
    }
}

/// Render an angle the way callers wrote it: `90`, `45.5`, `-30`.
pub fn format_angle(angle: f64) -> String {
    // `-0.0 + 0.0` is `0.0`, so a negative zero prints as "0".
    format!("{}", angle + 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles_print_without_trailing_zeroes() {
        assert_eq!(format_angle(90.0), "90");
        assert_eq!(format_angle(45.5), "45.5");
        assert_eq!(format_angle(-30.0), "-30");
        assert_eq!(format_angle(-0.0), "0");
    }
}
