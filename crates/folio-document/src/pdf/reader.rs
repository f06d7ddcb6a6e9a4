// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader: parse an in-memory PDF with `lopdf` and report its page tree
// geometry and document information dictionary.

use folio_core::error::DocumentError;
use folio_core::types::PdfMetadata;
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, instrument, warn};

/// Guard against cyclic `/Parent` chains in broken page trees.
const MAX_PAGE_TREE_DEPTH: usize = 64;

/// Read-only view over a parsed PDF.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Parse raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocumentError> {
        let document = Document::load_mem(data).map_err(|err| {
            DocumentError::Pdf(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height of a page (1-indexed) from its media box, in PDF
    /// user-space units.
    ///
    /// A page without its own `/MediaBox` inherits the nearest ancestor's.
    pub fn page_size(&self, page_number: u32) -> Result<(f64, f64), DocumentError> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            DocumentError::Pdf(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let [llx, lly, urx, ury] = self.inherited_media_box(page_id)?;
        Ok(((urx - llx).abs(), (ury - lly).abs()))
    }

    /// Page count plus first-page geometry. Fails for documents without pages.
    #[instrument(skip(self))]
    pub fn metadata(&self) -> Result<PdfMetadata, DocumentError> {
        let page_count = self.page_count();
        if page_count == 0 {
            return Err(DocumentError::Pdf("document has no pages".into()));
        }

        let (first_page_width, first_page_height) = self.page_size(1)?;
        let page_count = u32::try_from(page_count)
            .map_err(|_| DocumentError::Pdf(format!("page count {} too large", page_count)))?;

        debug!(page_count, first_page_width, first_page_height, "PDF metadata read");
        Ok(PdfMetadata {
            page_count,
            first_page_width,
            first_page_height,
        })
    }

    /// `/Author` from the document information dictionary, if present.
    pub fn author(&self) -> Option<String> {
        self.info_text(b"Author")
    }

    /// `/CreationDate` from the document information dictionary, verbatim
    /// (PDF date syntax, e.g. `D:20250109113500Z`).
    pub fn creation_date(&self) -> Option<String> {
        self.info_text(b"CreationDate")
    }

    // -- Helpers --------------------------------------------------------------

    /// Walk from the page up through `/Parent` until a `/MediaBox` is found.
    fn inherited_media_box(&self, page_id: ObjectId) -> Result<[f64; 4], DocumentError> {
        let mut current = Some(page_id);

        for _ in 0..MAX_PAGE_TREE_DEPTH {
            let Some(node_id) = current else {
                break;
            };
            let node = self.document.get_dictionary(node_id).map_err(|err| {
                DocumentError::Pdf(format!("cannot read page tree node {:?}: {}", node_id, err))
            })?;

            if let Ok(media_box) = node.get(b"MediaBox") {
                return self.rectangle(media_box);
            }

            current = node.get(b"Parent").and_then(Object::as_reference).ok();
        }

        Err(DocumentError::Pdf(format!(
            "page {:?} has no resolvable /MediaBox",
            page_id
        )))
    }

    /// Resolve a rectangle object (possibly indirect) into four numbers.
    fn rectangle(&self, object: &Object) -> Result<[f64; 4], DocumentError> {
        let array = self
            .resolve(object)
            .as_array()
            .map_err(|err| DocumentError::Pdf(format!("/MediaBox is not an array: {}", err)))?;

        if array.len() != 4 {
            return Err(DocumentError::Pdf(format!(
                "/MediaBox has {} entries, expected 4",
                array.len()
            )));
        }

        let mut rect = [0.0f64; 4];
        for (slot, entry) in rect.iter_mut().zip(array) {
            let value = self.resolve(entry).as_float().map_err(|err| {
                DocumentError::Pdf(format!("/MediaBox entry is not a number: {}", err))
            })?;
            *slot = f64::from(value);
        }
        Ok(rect)
    }

    /// Follow an indirect reference once; direct objects are returned as-is.
    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    /// Text value of an `/Info` entry, or `None` when absent or not a string.
    fn info_text(&self, key: &[u8]) -> Option<String> {
        let info = self.info_dictionary()?;
        match info.get(key).ok().map(|value| self.resolve(value)) {
            Some(Object::String(bytes, _)) => Some(decode_text_string(bytes)),
            Some(_) => {
                warn!(key = %String::from_utf8_lossy(key), "Ignoring non-string /Info value");
                None
            }
            None => None,
        }
    }

    fn info_dictionary(&self) -> Option<&Dictionary> {
        let info = self.document.trailer.get(b"Info").ok()?;
        self.resolve(info).as_dict().ok()
    }
}

/// Decode a PDF text string: UTF-16BE when it carries a byte order mark,
/// PDFDocEncoding (treated as Latin-1) otherwise.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pdf_bytes, pdf_bytes_with_info};

    #[test]
    fn counts_pages_and_reads_inherited_media_box() {
        let reader = PdfReader::from_bytes(&pdf_bytes(2, 612, 792)).unwrap();
        assert_eq!(reader.page_count(), 2);
        assert_eq!(reader.page_size(1).unwrap(), (612.0, 792.0));
        assert_eq!(reader.page_size(2).unwrap(), (612.0, 792.0));
    }

    #[test]
    fn metadata_reports_first_page() {
        let meta = PdfReader::from_bytes(&pdf_bytes(3, 595, 842))
            .unwrap()
            .metadata()
            .unwrap();
        assert_eq!(meta.page_count, 3);
        assert_eq!(meta.first_page_width, 595.0);
        assert_eq!(meta.first_page_height, 842.0);
    }

    #[test]
    fn zero_pages_is_an_error() {
        let reader = PdfReader::from_bytes(&pdf_bytes(0, 612, 792)).unwrap();
        assert!(matches!(reader.metadata(), Err(DocumentError::Pdf(_))));
    }

    #[test]
    fn page_out_of_range_is_an_error() {
        let reader = PdfReader::from_bytes(&pdf_bytes(1, 612, 792)).unwrap();
        assert!(reader.page_size(2).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(PdfReader::from_bytes(b"%PDF-1.5 not really").is_err());
        assert!(PdfReader::from_bytes(b"").is_err());
    }

    #[test]
    fn reads_info_dictionary() {
        let reader =
            PdfReader::from_bytes(&pdf_bytes_with_info(1, "Ada Lovelace", "D:20250109113500Z"))
                .unwrap();
        assert_eq!(reader.author().as_deref(), Some("Ada Lovelace"));
        assert_eq!(reader.creation_date().as_deref(), Some("D:20250109113500Z"));
    }

    #[test]
    fn missing_info_yields_none() {
        let reader = PdfReader::from_bytes(&pdf_bytes(1, 612, 792)).unwrap();
        assert!(reader.author().is_none());
        assert!(reader.creation_date().is_none());
    }

    #[test]
    fn decodes_utf16_text_strings() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9];
        assert_eq!(decode_text_string(&bytes), "Aé");
        assert_eq!(decode_text_string(b"plain"), "plain");
    }
}
