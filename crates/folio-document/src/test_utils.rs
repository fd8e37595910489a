// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixtures for tests: small generated PDFs and a renderer that needs no native
// library. Compiled for this crate's tests and, via the `test-utils` feature,
// for downstream test suites.

use std::io::Cursor;

use folio_core::error::{FolioError, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

use crate::pdf::pages;
use crate::traits::RenderEngine;

/// Build an `n`-page Letter document whose page `i` shows the text `Page i`.
///
/// /MediaBox and /Resources live on the root /Pages node so every page
/// inherits them.
pub fn sample_pdf(page_count: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    let mut resources = Dictionary::new();
    resources.set("Font", Object::Dictionary(fonts));

    let mut kids = Vec::new();
    for number in 1..=page_count {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(24)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(format!("Page {number}").into_bytes(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let encoded = content.encode().expect("fixture content encodes");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(i64::from(page_count))),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ]),
        ),
        ("Resources", Object::Dictionary(resources)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output).expect("fixture PDF serialises");
    output
}

/// Every literal string shown with `Tj` on each page, in page order.
pub fn page_strings(pdf: &[u8]) -> Vec<Vec<String>> {
    let Ok(doc) = Document::load_mem(pdf) else {
        return Vec::new();
    };
    pages::page_ids(&doc)
        .into_iter()
        .map(|page_id| {
            let Ok(raw) = doc.get_page_content(page_id) else {
                return Vec::new();
            };
            let Ok(content) = Content::decode(&raw) else {
                return Vec::new();
            };
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// The `Page N` label of each page, in page order.
pub fn page_labels(pdf: &[u8]) -> Vec<String> {
    page_strings(pdf)
        .into_iter()
        .map(|strings| {
            strings
                .into_iter()
                .find(|s| s.starts_with("Page "))
                .unwrap_or_default()
        })
        .collect()
}

/// Every operator used in the content of a 1-based page.
pub fn page_operators(pdf: &[u8], page_number: usize) -> Vec<String> {
    let Ok(doc) = Document::load_mem(pdf) else {
        return Vec::new();
    };
    let Some(&page_id) = pages::page_ids(&doc).get(page_number.saturating_sub(1)) else {
        return Vec::new();
    };
    doc.get_page_content(page_id)
        .ok()
        .and_then(|raw| Content::decode(&raw).ok())
        .map(|content| content.operations.into_iter().map(|op| op.operator).collect())
        .unwrap_or_default()
}

/// A small opaque PNG of the given size and colour.
pub fn sample_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(rgba));
    let mut output = Cursor::new(Vec::new());
    image
        .write_to(&mut output, ImageFormat::Png)
        .expect("fixture PNG encodes");
    output.into_inner()
}

/// Renders blank white pages sized from each page's /MediaBox and reports the
/// `Tj` strings as page text. Stands in for a native rasterizer in tests.
#[derive(Debug, Default)]
pub struct FixtureRenderer;

impl RenderEngine for FixtureRenderer {
    fn page_count(&self, pdf: &[u8]) -> Result<u32> {
        let doc = pages::load(pdf)?;
        Ok(doc.get_pages().len() as u32)
    }

    fn page_text(&self, pdf: &[u8], page_number: u32) -> Result<Vec<String>> {
        page_strings(pdf)
            .into_iter()
            .nth(page_number.saturating_sub(1) as usize)
            .ok_or_else(|| FolioError::RenderError(format!("page {page_number} out of range")))
    }

    fn render_page(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<RgbaImage> {
        let doc = pages::load(pdf)?;
        let page_id = pages::page_id(&doc, page_number.saturating_sub(1) as usize)
            .map_err(|err| FolioError::RenderError(err.to_string()))?;
        let (_, _, width, height) = pages::page_box(&doc, page_id);
        let width = ((width * scale).round() as u32).max(1);
        let height = ((height * scale).round() as u32).max(1);
        Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_pdf_has_labelled_pages() {
        let pdf = sample_pdf(3);
        assert_eq!(page_labels(&pdf), vec!["Page 1", "Page 2", "Page 3"]);
    }

    #[test]
    fn fixture_renderer_scales_media_box() {
        let pdf = sample_pdf(2);
        let renderer = FixtureRenderer;
        assert_eq!(renderer.page_count(&pdf).unwrap(), 2);
        let surface = renderer.render_page(&pdf, 2, 0.5).unwrap();
        assert_eq!(surface.dimensions(), (306, 396));
        assert_eq!(renderer.page_text(&pdf, 1).unwrap(), vec!["Page 1"]);
        assert!(renderer.render_page(&pdf, 3, 1.0).is_err());
    }
}
