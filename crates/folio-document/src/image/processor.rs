// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: decode, inspect, and rotate raster images in memory using
// the `image` and `imageproc` crates.

use folio_core::error::DocumentError;
use folio_core::types::ImageMetadata;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::geometric_transformations::{self, Interpolation};
use tracing::{debug, info, instrument, warn};

/// Angles closer than this to a multiple of 90 degrees take the lossless path.
const RIGHT_ANGLE_TOLERANCE: f64 = 0.01;

/// Image processing pipeline operating on a single in-memory image.
///
/// Transformations consume `self` and return a new `ImageProcessor`, so the
/// source bytes a processor was decoded from are never touched.
///
/// ```ignore
/// let png = ImageProcessor::from_bytes(&bytes)?
///     .rotate(30.0)
///     .to_png_bytes()?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, DocumentError> {
        let img = image::load_from_memory(data)
            .map_err(|err| DocumentError::Image(format!("failed to decode image: {}", err)))?;
        debug!(
            width = img.width(),
            height = img.height(),
            color = ?img.color(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Number of colour channels of the decoded colour type.
    pub fn channel_count(&self) -> u8 {
        self.image.color().channel_count()
    }

    /// Structural metadata of the current image.
    pub fn metadata(&self) -> ImageMetadata {
        ImageMetadata {
            width: self.width(),
            height: self.height(),
            channel_count: self.channel_count(),
        }
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate the image by an arbitrary angle in degrees, clockwise-positive.
    ///
    /// Exact multiples of 90 use lossless pixel rotation. Any other angle is
    /// resampled bicubically onto a canvas grown to the bounding box of the
    /// rotated rectangle, so no corner is cropped; uncovered pixels are
    /// transparent. The angle is reduced modulo 360 in `f64` before anything
    /// narrower sees it; a non-finite angle leaves the image untouched.
    #[instrument(skip_all, fields(degrees = degrees))]
    pub fn rotate(self, degrees: f64) -> Self {
        info!(
            degrees,
            width = self.image.width(),
            height = self.image.height(),
            "Rotating image"
        );

        let normalised = degrees.rem_euclid(360.0);
        if !normalised.is_finite() {
            warn!(degrees, "non-finite rotation angle ignored");
            return self;
        }

        // Fast-path for exact multiples of 90. `rotate90` is clockwise.
        if (normalised - 90.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self {
                image: self.image.rotate90(),
            };
        }
        if (normalised - 180.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self {
                image: self.image.rotate180(),
            };
        }
        if (normalised - 270.0).abs() < RIGHT_ANGLE_TOLERANCE {
            return Self {
                image: self.image.rotate270(),
            };
        }
        if normalised < RIGHT_ANGLE_TOLERANCE || (360.0 - normalised) < RIGHT_ANGLE_TOLERANCE {
            return self;
        }

        let rgba = self.image.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        let (canvas_w, canvas_h) = expanded_canvas(width, height, normalised);

        // Centre the source on the enlarged canvas, then rotate about the
        // canvas centre. imageproc rotates clockwise in image space (y down),
        // matching the external convention, so the angle is passed unchanged.
        let transparent = Rgba([0u8, 0, 0, 0]);
        let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, transparent);
        let offset_x = i64::from((canvas_w - width) / 2);
        let offset_y = i64::from((canvas_h - height) / 2);
        image::imageops::overlay(&mut canvas, &rgba, offset_x, offset_y);

        let rotated: RgbaImage = geometric_transformations::rotate_about_center(
            &canvas,
            normalised.to_radians() as f32,
            Interpolation::Bicubic,
            transparent,
        );

        debug!(
            new_w = rotated.width(),
            new_h = rotated.height(),
            "General rotation applied"
        );
        Self {
            image: DynamicImage::ImageRgba8(rotated),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Canvas size bounding a `width` x `height` rectangle rotated by `degrees`.
///
/// Never smaller than the source in either dimension, so centring the source
/// on the canvas cannot underflow.
pub fn expanded_canvas(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let radians = degrees.to_radians();
    let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
    let (w, h) = (f64::from(width), f64::from(height));

    // Shave floating point noise before rounding up.
    let bound = |value: f64| (value - 1e-6).ceil().max(1.0) as u32;
    let canvas_w = bound(w * cos + h * sin).max(width);
    let canvas_h = bound(w * sin + h * cos).max(height);
    (canvas_w, canvas_h)
}

/// MIME type of an encoded image, sniffed from its magic bytes.
///
/// Returns `None` when the bytes are not a format the `image` crate knows.
pub fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    image::guess_format(data).ok().map(|format| format.to_mime_type())
}

/// Preferred file extension of an encoded image, sniffed from its magic bytes.
pub fn sniff_extension(data: &[u8]) -> Option<&'static str> {
    image::guess_format(data)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, DocumentError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| DocumentError::Image(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
