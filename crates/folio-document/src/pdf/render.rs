// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rendering: rasterize a single PDF page at a given resolution.
//
// The pipeline only depends on the `PageRenderer` trait. The production
// backend is PDFium via `pdfium-render` (feature "pdfium"); tests plug in
// their own renderers.

use folio_core::error::DocumentError;
use image::DynamicImage;

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Rasterizes one page of a PDF.
pub trait PageRenderer: Send + Sync {
    /// Render page `page_number` (1-indexed) of `pdf` at `dpi` dots per inch.
    fn render_page(
        &self,
        pdf: &[u8],
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, DocumentError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Pixel size of a `width_pt` x `height_pt` page rendered at `dpi`.
pub fn pixel_size(width_pt: f64, height_pt: f64, dpi: u32) -> (u32, u32) {
    let scale = f64::from(dpi) / f64::from(POINTS_PER_INCH);
    let to_px = |points: f64| (points * scale).round().max(1.0) as u32;
    (to_px(width_pt), to_px(height_pt))
}

/// Renderer used when the crate is built without a rendering backend.
/// Every call fails with `DocumentError::Render`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableRenderer;

impl PageRenderer for UnavailableRenderer {
    fn render_page(
        &self,
        _pdf: &[u8],
        page_number: u32,
        _dpi: u32,
    ) -> Result<DynamicImage, DocumentError> {
        Err(DocumentError::Render(format!(
            "cannot render page {}: built without PDF rendering support",
            page_number
        )))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium::PdfiumRenderer;

#[cfg(feature = "pdfium")]
mod pdfium {
    use std::path::PathBuf;
    use std::sync::Mutex;

    use folio_core::error::DocumentError;
    use image::DynamicImage;
    use pdfium_render::prelude::*;
    use tracing::{debug, info, instrument};

    use super::{PageRenderer, pixel_size};

    /// Renders pages with the PDFium shared library.
    ///
    /// The library is bound on each call and released afterwards. PDFium is
    /// not thread-safe, so renders are serialized through `lock`.
    pub struct PdfiumRenderer {
        /// Directory holding the platform PDFium library; `None` searches the
        /// system library path.
        library_dir: Option<PathBuf>,
        lock: Mutex<()>,
    }

    impl PdfiumRenderer {
        pub fn new(library_dir: Option<PathBuf>) -> Self {
            Self {
                library_dir,
                lock: Mutex::new(()),
            }
        }

        fn bind(&self) -> Result<Pdfium, DocumentError> {
            let bindings = match &self.library_dir {
                Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    &dir.to_string_lossy().into_owned(),
                )),
                None => Pdfium::bind_to_system_library(),
            }
            .map_err(|err| DocumentError::Render(format!("failed to load PDFium: {}", err)))?;
            Ok(Pdfium::new(bindings))
        }
    }

    impl Default for PdfiumRenderer {
        fn default() -> Self {
            Self::new(None)
        }
    }

    impl PageRenderer for PdfiumRenderer {
        #[instrument(skip_all, fields(pdf_len = pdf.len(), page_number = page_number, dpi = dpi))]
        fn render_page(
            &self,
            pdf: &[u8],
            page_number: u32,
            dpi: u32,
        ) -> Result<DynamicImage, DocumentError> {
            let _guard = self
                .lock
                .lock()
                .map_err(|_| DocumentError::Render("PDFium lock poisoned".into()))?;

            let pdfium = self.bind()?;
            let document = pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .map_err(|err| DocumentError::Render(format!("failed to open PDF: {}", err)))?;

            let index = PdfPageIndex::try_from(page_number.saturating_sub(1)).map_err(|_| {
                DocumentError::Render(format!("page {} exceeds PDFium page index", page_number))
            })?;
            let page = document.pages().get(index).map_err(|err| {
                DocumentError::Render(format!("failed to load page {}: {}", page_number, err))
            })?;

            let (width_px, height_px) = pixel_size(
                f64::from(page.width().value),
                f64::from(page.height().value),
                dpi,
            );
            let to_pixels = |value: u32| {
                Pixels::try_from(value).map_err(|_| {
                    DocumentError::Render(format!(
                        "page {} is too large to render at {} dpi",
                        page_number, dpi
                    ))
                })
            };
            let config = PdfRenderConfig::new()
                .set_target_width(to_pixels(width_px)?)
                .set_maximum_height(to_pixels(height_px)?);
            let bitmap = page.render_with_config(&config).map_err(|err| {
                DocumentError::Render(format!("failed to render page {}: {}", page_number, err))
            })?;
            let image = bitmap.as_image();

            debug!(
                width = image.width(),
                height = image.height(),
                "Page rendered"
            );
            info!(page_number, dpi, "PDF page rasterized");
            Ok(image)
        }

        fn name(&self) -> &'static str {
            "pdfium"
        }
    }
}
