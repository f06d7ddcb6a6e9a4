// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-code fixtures for unit tests: small PNGs and hand-built PDFs.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::{Document, Object, Stream, dictionary};

/// Encode a solid RGB image of the given size as PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode fixture png");
    buffer
}

/// Build a PDF with `pages` empty pages. The media box is declared once on the
/// page tree root and inherited by every page.
pub fn pdf_bytes(pages: usize, width: i64, height: i64) -> Vec<u8> {
    build_pdf(pages, width, height, None)
}

/// Same as [`pdf_bytes`] but with an `/Info` dictionary carrying an author
/// and creation date.
pub fn pdf_bytes_with_info(pages: usize, author: &str, created: &str) -> Vec<u8> {
    build_pdf(pages, 612, 792, Some((author, created)))
}

fn build_pdf(pages: usize, width: i64, height: i64, info: Option<(&str, &str)>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages);
    for _ in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages as i64,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some((author, created)) = info {
        let info_id = doc.add_object(dictionary! {
            "Author" => Object::string_literal(author),
            "CreationDate" => Object::string_literal(created),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialise fixture pdf");
    buffer
}
