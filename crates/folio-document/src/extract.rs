// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata extraction: one entry point dispatching on the document kind to a
// pure image or PDF strategy. Nothing here touches stored state.

use folio_core::error::ExtractionError;
use folio_core::types::{DocumentKind, ImageMetadata, Metadata, PdfMetadata};
use tracing::{debug, instrument};

use crate::image::processor::{ImageProcessor, sniff_mime_type};
use crate::pdf::reader::PdfReader;

/// Fallback MIME type for images whose format cannot be sniffed.
pub const UNKNOWN_IMAGE_MIME: &str = "image/unknown";

/// Extract structural metadata from `bytes` interpreted as `kind`.
#[instrument(skip_all, fields(%kind, bytes_len = bytes.len()))]
pub fn extract(kind: DocumentKind, bytes: &[u8]) -> Result<Metadata, ExtractionError> {
    let metadata = match kind {
        DocumentKind::Image => Metadata::Image(extract_image(bytes)?),
        DocumentKind::Pdf => Metadata::Pdf(extract_pdf(bytes)?),
    };
    debug!(?metadata, "Metadata extracted");
    Ok(metadata)
}

fn extract_image(bytes: &[u8]) -> Result<ImageMetadata, ExtractionError> {
    ImageProcessor::from_bytes(bytes)
        .map(|processor| processor.metadata())
        .map_err(|err| ExtractionError::UnsupportedFormat(err.to_string()))
}

fn extract_pdf(bytes: &[u8]) -> Result<PdfMetadata, ExtractionError> {
    PdfReader::from_bytes(bytes)
        .and_then(|reader| reader.metadata())
        .map_err(|err| ExtractionError::MalformedDocument(err.to_string()))
}

/// Kind-specific read-time details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentDetails {
    Image {
        mime_type: String,
    },
    Pdf {
        author: Option<String>,
        creation_date: Option<String>,
    },
}

/// Read-time details derived from stored bytes, never persisted.
///
/// Failures are swallowed: each field is best-effort.
pub fn inspect(kind: DocumentKind, bytes: &[u8]) -> DocumentDetails {
    match kind {
        DocumentKind::Image => DocumentDetails::Image {
            mime_type: sniff_mime_type(bytes).unwrap_or(UNKNOWN_IMAGE_MIME).to_string(),
        },
        DocumentKind::Pdf => match PdfReader::from_bytes(bytes) {
            Ok(reader) => DocumentDetails::Pdf {
                author: reader.author(),
                creation_date: reader.creation_date(),
            },
            Err(_) => DocumentDetails::Pdf {
                author: None,
                creation_date: None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pdf_bytes, pdf_bytes_with_info, png_bytes};

    #[test]
    fn image_metadata_for_rgb_png() {
        let meta = extract(DocumentKind::Image, &png_bytes(100, 50)).unwrap();
        let image = meta.as_image().expect("image metadata");
        assert_eq!((image.width, image.height, image.channel_count), (100, 50, 3));
    }

    #[test]
    fn non_image_bytes_are_unsupported() {
        let err = extract(DocumentKind::Image, b"0123456789").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn pdf_metadata_for_two_pages() {
        let meta = extract(DocumentKind::Pdf, &pdf_bytes(2, 612, 792)).unwrap();
        let pdf = meta.as_pdf().expect("pdf metadata");
        assert_eq!(pdf.page_count, 2);
        assert_eq!((pdf.first_page_width, pdf.first_page_height), (612.0, 792.0));
    }

    #[test]
    fn empty_pdf_is_malformed() {
        let err = extract(DocumentKind::Pdf, &pdf_bytes(0, 612, 792)).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedDocument(_)));
    }

    #[test]
    fn image_bytes_declared_as_pdf_are_malformed() {
        let err = extract(DocumentKind::Pdf, &png_bytes(4, 4)).unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedDocument(_)));
    }

    #[test]
    fn inspect_reports_mime_and_info() {
        assert_eq!(
            inspect(DocumentKind::Image, &png_bytes(2, 2)),
            DocumentDetails::Image {
                mime_type: "image/png".into()
            }
        );
        assert_eq!(
            inspect(DocumentKind::Image, b"junk"),
            DocumentDetails::Image {
                mime_type: UNKNOWN_IMAGE_MIME.into()
            }
        );
        assert_eq!(
            inspect(
                DocumentKind::Pdf,
                &pdf_bytes_with_info(1, "Grace", "D:20240101000000Z")
            ),
            DocumentDetails::Pdf {
                author: Some("Grace".into()),
                creation_date: Some("D:20240101000000Z".into()),
            }
        );
    }
}
