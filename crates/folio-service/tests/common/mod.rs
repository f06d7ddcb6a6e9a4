// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the folio-service integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::SystemTime;

use folio_core::FolioConfig;
use folio_core::error::{DocumentError, StoreError};
use folio_core::types::{DocumentKind, StorageLocation};
use folio_document::{PageRenderer, PdfReader, pixel_size};
use folio_service::DocumentService;
use folio_storage::{ContentStore, DocumentIndex, LocalContentStore};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use lopdf::{Document as PdfDocument, Object, Stream, dictionary};

// ---------------------------------------------------------------------------
// Document fixtures
// ---------------------------------------------------------------------------

/// Solid RGB image encoded as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 200]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode fixture png");
    buffer
}

/// PDF with `pages` empty US Letter pages (612 x 792 points).
pub fn pdf_bytes(pages: usize) -> Vec<u8> {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialise fixture pdf");
    buffer
}

/// Number of blob files under the store's namespaces.
pub fn blob_count(store_root: &Path) -> usize {
    ["images", "pdfs"]
        .iter()
        .filter_map(|ns| std::fs::read_dir(store_root.join(ns)).ok())
        .flat_map(|entries| entries.filter_map(|entry| entry.ok()))
        .filter(|entry| entry.path().is_file())
        .count()
}

// ---------------------------------------------------------------------------
// Renderers
// ---------------------------------------------------------------------------

/// Renders a blank page of the right pixel size, computed from the PDF's own
/// media box.
#[derive(Default)]
pub struct BlankRenderer {
    pub calls: AtomicUsize,
}

impl PageRenderer for BlankRenderer {
    fn render_page(
        &self,
        pdf: &[u8],
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (width, height) = PdfReader::from_bytes(pdf)?.page_size(page_number)?;
        let (px_w, px_h) = pixel_size(width, height, dpi);
        Ok(DynamicImage::ImageRgba8(RgbaImage::new(px_w, px_h)))
    }

    fn name(&self) -> &'static str {
        "blank"
    }
}

/// Always fails.
pub struct BrokenRenderer;

impl PageRenderer for BrokenRenderer {
    fn render_page(&self, _: &[u8], _: u32, _: u32) -> Result<DynamicImage, DocumentError> {
        Err(DocumentError::Render("renderer exploded".into()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Local store that counts calls and can be told to refuse writes.
pub struct FlakyStore {
    inner: LocalContentStore,
    pub fail_puts: AtomicBool,
    pub puts: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: LocalContentStore) -> Self {
        Self {
            inner,
            fail_puts: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }
}

impl ContentStore for FlakyStore {
    fn put(&self, kind: DocumentKind, bytes: &[u8]) -> Result<StorageLocation, StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                location: kind.namespace().into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.put(kind, bytes)
    }

    fn get(&self, location: &StorageLocation) -> Result<Vec<u8>, StoreError> {
        self.inner.get(location)
    }

    fn delete(&self, location: &StorageLocation) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(location)
    }

    fn exists(&self, location: &StorageLocation) -> Result<bool, StoreError> {
        self.inner.exists(location)
    }

    fn size(&self, location: &StorageLocation) -> Result<u64, StoreError> {
        self.inner.size(location)
    }

    fn modified(&self, location: &StorageLocation) -> Result<SystemTime, StoreError> {
        self.inner.modified(location)
    }

    fn locations(&self) -> Result<Vec<StorageLocation>, StoreError> {
        self.inner.locations()
    }
}

/// Store that files every blob under one fixed name, so the second commit
/// collides with the first on the index's unique location.
pub struct FixedLocationStore {
    inner: LocalContentStore,
    pub deletes: AtomicUsize,
}

impl FixedLocationStore {
    pub const LOCATION: &'static str = "images/fixed.png";

    pub fn new(inner: LocalContentStore) -> Self {
        Self {
            inner,
            deletes: AtomicUsize::new(0),
        }
    }
}

impl ContentStore for FixedLocationStore {
    fn put(&self, kind: DocumentKind, bytes: &[u8]) -> Result<StorageLocation, StoreError> {
        let written = self.inner.put(kind, bytes)?;
        let fixed = StorageLocation::new(Self::LOCATION);
        std::fs::rename(self.inner.resolve(&written)?, self.inner.resolve(&fixed)?).map_err(
            |source| StoreError::Write {
                location: fixed.to_string(),
                source,
            },
        )?;
        Ok(fixed)
    }

    fn get(&self, location: &StorageLocation) -> Result<Vec<u8>, StoreError> {
        self.inner.get(location)
    }

    fn delete(&self, location: &StorageLocation) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(location)
    }

    fn exists(&self, location: &StorageLocation) -> Result<bool, StoreError> {
        self.inner.exists(location)
    }

    fn size(&self, location: &StorageLocation) -> Result<u64, StoreError> {
        self.inner.size(location)
    }

    fn modified(&self, location: &StorageLocation) -> Result<SystemTime, StoreError> {
        self.inner.modified(location)
    }

    fn locations(&self) -> Result<Vec<StorageLocation>, StoreError> {
        self.inner.locations()
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// A service over a throwaway directory and an in-memory index.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub store: Arc<FlakyStore>,
    pub index: Arc<DocumentIndex>,
    pub renderer: Arc<BlankRenderer>,
    pub service: DocumentService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(FolioConfig::default())
    }

    pub fn with_config(config: FolioConfig) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let local = LocalContentStore::open(dir.path().join("media")).expect("open store");
        let store = Arc::new(FlakyStore::new(local));
        let index = Arc::new(DocumentIndex::open_in_memory().expect("open index"));
        let renderer = Arc::new(BlankRenderer::default());

        let service = DocumentService::from_parts(
            store.clone(),
            index.clone(),
            renderer.clone(),
            config,
        );
        Self {
            dir,
            store,
            index,
            renderer,
            service,
        }
    }

    pub fn store_root(&self) -> std::path::PathBuf {
        self.dir.path().join("media")
    }

    pub fn blobs(&self) -> usize {
        blob_count(&self.store_root())
    }
}
