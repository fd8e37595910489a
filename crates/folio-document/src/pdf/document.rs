// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document model backed by `lopdf`: merging, page selection, rotation,
// stamping, overlays and invisible text layers.

use std::collections::HashSet;

use folio_core::error::{FolioError, Result};
use folio_core::{AnnotationLayer, NumberPosition, OverlayObject, OverlaySnapshot};
use image::DynamicImage;
use lopdf::content::Operation;
use lopdf::{
    Dictionary, Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions, StringFormat,
};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use super::pages::{self, PageCloner};
use super::paint::{self, fill_color, name, real, stroke_color, text_matrix, win_ansi};
use crate::traits::{
    Anchor, DocumentEngine, ImageStamp, PageNumberStyle, RecognizedPage, TextStamp,
};

/// Font size of page numbers, in points.
const PAGE_NUMBER_SIZE: f32 = 12.0;

/// Distance of page numbers from the page edge, in points.
const PAGE_NUMBER_MARGIN: f32 = 30.0;

/// Line advance of multi-line overlay text, as a multiple of the font size.
const LINE_SPACING: f32 = 1.16;

/// Control-point distance for approximating a quarter ellipse with a Bézier curve.
const KAPPA: f32 = 0.552_284_8;

/// RC4 key length used when protecting documents.
const ENCRYPTION_KEY_BITS: usize = 128;

/// The in-tree document model.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentEngine for LopdfEngine {
    fn page_count(&self, pdf: &[u8]) -> Result<u32> {
        let doc = pages::load(pdf)?;
        Ok(doc.get_pages().len() as u32)
    }

    #[instrument(skip_all, fields(documents = documents.len()))]
    fn merge(&self, documents: &[&[u8]]) -> Result<Vec<u8>> {
        let (first, rest) = documents
            .split_first()
            .ok_or_else(|| FolioError::PdfError("no documents to merge".into()))?;

        let mut target = pages::load(first)?;
        // Flatten first so attributes inherited from the old root cannot leak
        // onto appended pages.
        let own_pages = pages::page_ids(&target);
        pages::rebuild_page_tree(&mut target, &own_pages)?;

        for (index, bytes) in rest.iter().enumerate() {
            let source = pages::load(bytes)?;
            let mut cloner = PageCloner::new(&source);
            let source_pages = pages::page_ids(&source);
            for &page_id in &source_pages {
                cloner.append_page(&mut target, page_id)?;
            }
            debug!(document = index + 2, pages = source_pages.len(), "Appended document");
        }

        target.prune_objects();
        let output = pages::save(&mut target, "merged document")?;
        info!(pages = target.get_pages().len(), output_bytes = output.len(), "PDFs merged");
        Ok(output)
    }

    #[instrument(skip_all, fields(requested = indices.len()))]
    fn select_pages(&self, pdf: &[u8], indices: &[usize]) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        let all = pages::page_ids(&doc);

        let mut seen = HashSet::new();
        let chosen: Vec<ObjectId> = indices
            .iter()
            .filter(|index| seen.insert(**index))
            .filter_map(|&index| {
                let page = all.get(index).copied();
                if page.is_none() {
                    warn!(index, total = all.len(), "Skipping out-of-range page");
                }
                page
            })
            .collect();
        if chosen.is_empty() {
            return Err(FolioError::PdfError("no pages selected".into()));
        }

        pages::rebuild_page_tree(&mut doc, &chosen)?;
        doc.prune_objects();
        debug!(kept = chosen.len(), total = all.len(), "Pages selected");
        pages::save(&mut doc, "page selection")
    }

    #[instrument(skip(self, pdf))]
    fn rotate_pages(&self, pdf: &[u8], degrees: i32) -> Result<Vec<u8>> {
        if degrees % 90 != 0 {
            return Err(FolioError::InvalidOption {
                key: "angle".into(),
                reason: format!("{degrees} is not a multiple of 90"),
            });
        }

        let mut doc = pages::load(pdf)?;
        for page_id in pages::page_ids(&doc) {
            let current = pages::inherited_attribute(&doc, page_id, b"Rotate")
                .as_ref()
                .and_then(pages::number)
                .unwrap_or(0.0) as i64;
            let rotation = (current + i64::from(degrees)).rem_euclid(360);
            let page = doc
                .get_dictionary_mut(page_id)
                .map_err(|err| FolioError::PdfError(format!("cannot update page {:?}: {}", page_id, err)))?;
            page.set("Rotate", Object::Integer(rotation));
        }

        info!(degrees, "Pages rotated");
        pages::save(&mut doc, "rotated document")
    }

    #[instrument(skip_all, fields(input_bytes = pdf.len()))]
    fn compress(&self, pdf: &[u8]) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        doc.prune_objects();
        doc.renumber_objects();
        doc.compress();
        let output = pages::save(&mut doc, "compressed document")?;
        info!(output_bytes = output.len(), "PDF compressed");
        Ok(output)
    }

    #[instrument(skip_all, fields(input_bytes = pdf.len()))]
    fn repair(&self, pdf: &[u8]) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        // Re-deriving the page tree fixes stale /Count and /Parent entries.
        let ids = pages::page_ids(&doc);
        if ids.is_empty() {
            return Err(FolioError::PdfError("no readable pages".into()));
        }
        pages::rebuild_page_tree(&mut doc, &ids)?;
        doc.prune_objects();
        doc.renumber_objects();
        info!(pages = ids.len(), "PDF rewritten");
        pages::save(&mut doc, "repaired document")
    }

    #[instrument(skip_all, fields(text_len = stamp.text.len()))]
    fn stamp_text(&self, pdf: &[u8], stamp: &TextStamp) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        for page_id in pages::page_ids(&doc) {
            let (x0, y0, width, height) = pages::page_box(&doc, page_id);
            let (x, y) = match stamp.anchor {
                Anchor::Centre { dx, dy } => (x0 + width / 2.0 + dx, y0 + height / 2.0 + dy),
                Anchor::Absolute { x, y } => (x0 + x, y0 + y),
            };
            let font = paint::helvetica(&mut doc, page_id)?;
            let opacity = stamp.opacity * stamp.color.opacity();
            let state = paint::opacity_state(&mut doc, page_id, opacity, opacity)?;
            paint::append_content(
                &mut doc,
                page_id,
                vec![
                    Operation::new("gs", vec![name(&state)]),
                    fill_color(stamp.color.fractions()),
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![name(&font), real(stamp.font_size)]),
                    text_matrix(x, y, stamp.rotation_degrees),
                    Operation::new("Tj", vec![win_ansi(&stamp.text)]),
                    Operation::new("ET", vec![]),
                ],
            )?;
        }
        info!(pages = doc.get_pages().len(), "Text stamped");
        pages::save(&mut doc, "stamped document")
    }

    #[instrument(skip(self, pdf))]
    fn number_pages(&self, pdf: &[u8], style: &PageNumberStyle) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        for (index, page_id) in pages::page_ids(&doc).into_iter().enumerate() {
            let label = (u64::from(style.start) + index as u64).to_string();
            let page_box = pages::page_box(&doc, page_id);
            let label_width = paint::text_width(&label, PAGE_NUMBER_SIZE);
            let (x, y) = number_origin(style.position, page_box, label_width);
            let font = paint::helvetica(&mut doc, page_id)?;
            paint::append_content(
                &mut doc,
                page_id,
                vec![
                    fill_color([0.0, 0.0, 0.0]),
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![name(&font), real(PAGE_NUMBER_SIZE)]),
                    text_matrix(x, y, 0.0),
                    Operation::new("Tj", vec![win_ansi(&label)]),
                    Operation::new("ET", vec![]),
                ],
            )?;
        }
        pages::save(&mut doc, "numbered document")
    }

    #[instrument(skip_all, fields(page = stamp.page_index))]
    fn stamp_image(&self, pdf: &[u8], stamp: &ImageStamp) -> Result<Vec<u8>> {
        let image = ::image::load_from_memory(&stamp.image)
            .map_err(|err| FolioError::ImageError(format!("failed to decode stamp image: {}", err)))?;
        let mut doc = pages::load(pdf)?;
        let page_id = pages::page_id(&doc, stamp.page_index)?;
        let (x0, y0, _, _) = pages::page_box(&doc, page_id);
        let xobject = paint::image_xobject(&mut doc, page_id, &image)?;
        paint::append_content(
            &mut doc,
            page_id,
            paint::draw_xobject(&xobject, x0 + stamp.x, y0 + stamp.y, stamp.width, stamp.height),
        )?;
        debug!(width = stamp.width, height = stamp.height, "Image stamped");
        pages::save(&mut doc, "stamped document")
    }

    #[instrument(skip_all, fields(pages = layer.len()))]
    fn apply_overlays(&self, pdf: &[u8], layer: &AnnotationLayer) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        let ids = pages::page_ids(&doc);
        for (&page_number, snapshot) in layer {
            if snapshot.is_empty() {
                continue;
            }
            let Some(&page_id) = (page_number as usize).checked_sub(1).and_then(|index| ids.get(index)) else {
                warn!(page_number, total = ids.len(), "Overlay for missing page ignored");
                continue;
            };
            if snapshot.width == 0 || snapshot.height == 0 {
                warn!(page_number, "Overlay with empty canvas ignored");
                continue;
            }
            let space = PageSpace::new(pages::page_box(&doc, page_id), snapshot);
            let mut operations = Vec::new();
            for object in &snapshot.objects {
                operations.extend(overlay_operations(&mut doc, page_id, &space, object)?);
            }
            paint::append_content(&mut doc, page_id, operations)?;
            debug!(page_number, objects = snapshot.objects.len(), "Overlay applied");
        }
        pages::save(&mut doc, "edited document")
    }

    #[instrument(skip_all, fields(pages = recognized.len()))]
    fn add_text_layer(&self, pdf: &[u8], recognized: &[RecognizedPage]) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        let ids = pages::page_ids(&doc);
        for page in recognized {
            let Some(&page_id) = ids.get(page.page_index) else {
                warn!(page = page.page_index + 1, "Recognition result for missing page ignored");
                continue;
            };
            if page.words.is_empty() || page.image_width == 0 || page.image_height == 0 {
                continue;
            }
            let (x0, y0, width, height) = pages::page_box(&doc, page_id);
            let sx = width / page.image_width as f32;
            let sy = height / page.image_height as f32;
            let font = paint::helvetica(&mut doc, page_id)?;

            let mut operations = vec![
                Operation::new("BT", vec![]),
                // Render mode 3: neither fill nor stroke, but selectable.
                Operation::new("Tr", vec![Object::Integer(3)]),
            ];
            for word in &page.words {
                let size = (word.height * sy).max(1.0);
                let natural = paint::text_width(&word.text, size);
                let stretch = if natural > 0.0 { word.width * sx / natural * 100.0 } else { 100.0 };
                operations.push(Operation::new("Tf", vec![name(&font), real(size)]));
                operations.push(Operation::new("Tz", vec![real(stretch)]));
                operations.push(text_matrix(x0 + word.left * sx, y0 + height - (word.top + word.height) * sy, 0.0));
                operations.push(Operation::new("Tj", vec![win_ansi(&word.text)]));
            }
            operations.push(Operation::new("ET", vec![]));
            paint::append_content(&mut doc, page_id, operations)?;
        }
        pages::save(&mut doc, "searchable document")
    }

    #[instrument(skip_all, fields(images = images.len()))]
    fn images_to_pdf(&self, images: &[DynamicImage]) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(FolioError::ImageError("no images to convert".into()));
        }

        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::with_capacity(images.len());
        for image in images {
            let (width, height) = (image.width() as f32, image.height() as f32);
            let image_id = paint::add_image(&mut doc, image);
            let mut xobjects = Dictionary::new();
            xobjects.set("Im0", Object::Reference(image_id));
            let mut resources = Dictionary::new();
            resources.set("XObject", Object::Dictionary(xobjects));

            let content = lopdf::content::Content {
                operations: paint::draw_xobject(b"Im0", 0.0, 0.0, width, height),
            }
            .encode()
            .map_err(|err| FolioError::PdfError(format!("failed to encode page: {}", err)))?;
            let content_id = doc.add_object(lopdf::Stream::new(Dictionary::new(), content));

            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![real(0.0), real(0.0), real(width), real(height)]),
                ),
                ("Resources", Object::Dictionary(resources)),
                ("Contents", Object::Reference(content_id)),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc.compress();

        info!(pages = count, "Images converted to PDF");
        pages::save(&mut doc, "image document")
    }

    #[instrument(skip_all)]
    fn protect(&self, pdf: &[u8], password: &str) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        if doc.is_encrypted() {
            return Err(FolioError::UnsupportedDocument(
                "the document is already password-protected".into(),
            ));
        }
        // Key derivation hashes the first file identifier.
        if doc.trailer.get(b"ID").is_err() {
            doc.trailer.set("ID", file_identifier(pdf));
        }

        let version = EncryptionVersion::V2 {
            document: &doc,
            owner_password: password,
            user_password: password,
            key_length: ENCRYPTION_KEY_BITS,
            permissions: Permissions::default(),
        };
        let state = EncryptionState::try_from(version)
            .map_err(|err| FolioError::PdfError(format!("failed to derive encryption keys: {}", err)))?;
        doc.encrypt(&state)
            .map_err(|err| FolioError::PdfError(format!("failed to encrypt document: {}", err)))?;

        info!(pages = doc.get_pages().len(), "Document protected");
        pages::save(&mut doc, "protected document")
    }

    #[instrument(skip_all)]
    fn unlock(&self, pdf: &[u8], password: &str) -> Result<Vec<u8>> {
        let mut doc = pages::load(pdf)?;
        if !doc.is_encrypted() {
            debug!("Document is not encrypted");
            return pages::save(&mut doc, "unlocked document");
        }

        if doc.encryption_state.is_some() {
            // The loader already opened it with the empty user password.
            strip_encryption(&mut doc);
        } else {
            doc.authenticate_password(password)
                .map_err(|_| FolioError::precondition("That password does not open this PDF."))?;
            let mut stored = pages::load_stored_objects(doc, pdf);
            stored
                .decrypt(password)
                .map_err(|err| FolioError::PdfError(format!("failed to decrypt document: {}", err)))?;
            doc = stored;
        }

        info!(pages = doc.get_pages().len(), "Document unlocked");
        pages::save(&mut doc, "unlocked document")
    }
}

/// A file identifier derived from the original bytes, used for both entries.
fn file_identifier(pdf: &[u8]) -> Object {
    let digest = Sha256::digest(pdf);
    let id = Object::String(digest[..16].to_vec(), StringFormat::Hexadecimal);
    Object::Array(vec![id.clone(), id])
}

fn strip_encryption(doc: &mut Document) {
    if let Ok(id) = doc.trailer.get(b"Encrypt").and_then(Object::as_reference) {
        doc.objects.remove(&id);
    }
    doc.trailer.remove(b"Encrypt");
    doc.encryption_state = None;
}

/// Bottom-left origin of a page number label.
fn number_origin(position: NumberPosition, (x0, y0, width, height): (f32, f32, f32, f32), label_width: f32) -> (f32, f32) {
    let left = x0 + PAGE_NUMBER_MARGIN;
    let centre = x0 + (width - label_width) / 2.0;
    let right = x0 + width - PAGE_NUMBER_MARGIN - label_width;
    let bottom = y0 + PAGE_NUMBER_MARGIN;
    let top = y0 + height - PAGE_NUMBER_MARGIN - PAGE_NUMBER_SIZE;
    match position {
        NumberPosition::BottomCenter => (centre, bottom),
        NumberPosition::BottomRight => (right, bottom),
        NumberPosition::BottomLeft => (left, bottom),
        NumberPosition::TopCenter => (centre, top),
        NumberPosition::TopRight => (right, top),
        NumberPosition::TopLeft => (left, top),
    }
}

// -- Overlay geometry ---------------------------------------------------------

/// Maps canvas pixels (top-left origin) onto page points (bottom-left origin).
struct PageSpace {
    x0: f32,
    top: f32,
    sx: f32,
    sy: f32,
}

impl PageSpace {
    fn new((x0, y0, width, height): (f32, f32, f32, f32), snapshot: &OverlaySnapshot) -> Self {
        Self {
            x0,
            top: y0 + height,
            sx: width / snapshot.width as f32,
            sy: height / snapshot.height as f32,
        }
    }

    fn x(&self, px: f32) -> f32 {
        self.x0 + px * self.sx
    }

    fn y(&self, py: f32) -> f32 {
        self.top - py * self.sy
    }
}

fn overlay_operations(
    doc: &mut Document,
    page_id: ObjectId,
    space: &PageSpace,
    object: &OverlayObject,
) -> Result<Vec<Operation>> {
    let mut ops = vec![Operation::new("q", vec![])];
    match object {
        OverlayObject::Text { left, top, text, font_size, fill } => {
            let font = paint::helvetica(doc, page_id)?;
            if fill.a < u8::MAX {
                let state = paint::opacity_state(doc, page_id, fill.opacity(), fill.opacity())?;
                ops.push(Operation::new("gs", vec![name(&state)]));
            }
            let size = font_size * space.sy;
            ops.push(fill_color(fill.fractions()));
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![name(&font), real(size)]));
            for (line_index, line) in text.lines().enumerate() {
                let baseline = top + font_size * (1.0 + line_index as f32 * LINE_SPACING);
                ops.push(text_matrix(space.x(*left), space.y(baseline), 0.0));
                ops.push(Operation::new("Tj", vec![win_ansi(line)]));
            }
            ops.push(Operation::new("ET", vec![]));
        }
        OverlayObject::Rect { left, top, width, height, fill, stroke, stroke_width } => {
            let Some(paint_op) = shape_style(doc, page_id, space, *fill, *stroke, *stroke_width, &mut ops)? else {
                return Ok(Vec::new());
            };
            ops.push(Operation::new(
                "re",
                vec![
                    real(space.x(*left)),
                    real(space.y(top + height)),
                    real(width * space.sx),
                    real(height * space.sy),
                ],
            ));
            ops.push(Operation::new(paint_op, vec![]));
        }
        OverlayObject::Ellipse { left, top, rx, ry, fill, stroke, stroke_width } => {
            let Some(paint_op) = shape_style(doc, page_id, space, *fill, *stroke, *stroke_width, &mut ops)? else {
                return Ok(Vec::new());
            };
            let (cx, cy) = (space.x(left + rx), space.y(top + ry));
            ops.extend(ellipse_path(cx, cy, rx * space.sx, ry * space.sy));
            ops.push(Operation::new(paint_op, vec![]));
        }
        OverlayObject::Path { points, stroke, stroke_width } => {
            let Some((first, rest)) = points.split_first() else {
                return Ok(Vec::new());
            };
            shape_style(doc, page_id, space, None, Some(*stroke), *stroke_width, &mut ops)?;
            ops.push(Operation::new("J", vec![Object::Integer(1)]));
            ops.push(Operation::new("j", vec![Object::Integer(1)]));
            ops.push(Operation::new("m", vec![real(space.x(first.x)), real(space.y(first.y))]));
            if rest.is_empty() {
                // A single tap still leaves a dot.
                ops.push(Operation::new("l", vec![real(space.x(first.x)), real(space.y(first.y))]));
            }
            for point in rest {
                ops.push(Operation::new("l", vec![real(space.x(point.x)), real(space.y(point.y))]));
            }
            ops.push(Operation::new("S", vec![]));
        }
        OverlayObject::Image { left, top, width, height, png } => {
            let image = ::image::load_from_memory(png)
                .map_err(|err| FolioError::ImageError(format!("failed to decode overlay image: {}", err)))?;
            let xobject = paint::image_xobject(doc, page_id, &image)?;
            ops.extend(paint::draw_xobject(
                &xobject,
                space.x(*left),
                space.y(top + height),
                width * space.sx,
                height * space.sy,
            ));
        }
    }
    ops.push(Operation::new("Q", vec![]));
    Ok(ops)
}

/// Push colour, width and opacity operators for a shape and return the
/// painting operator, or `None` when the shape is invisible.
fn shape_style(
    doc: &mut Document,
    page_id: ObjectId,
    space: &PageSpace,
    fill: Option<folio_core::Color>,
    stroke: Option<folio_core::Color>,
    stroke_width: f32,
    ops: &mut Vec<Operation>,
) -> Result<Option<&'static str>> {
    let paint_op = match (fill, stroke) {
        (Some(_), Some(_)) => "B",
        (Some(_), None) => "f",
        (None, Some(_)) => "S",
        (None, None) => return Ok(None),
    };
    let fill_alpha = fill.map_or(1.0, |c| c.opacity());
    let stroke_alpha = stroke.map_or(1.0, |c| c.opacity());
    if fill_alpha < 1.0 || stroke_alpha < 1.0 {
        let state = paint::opacity_state(doc, page_id, fill_alpha, stroke_alpha)?;
        ops.push(Operation::new("gs", vec![name(&state)]));
    }
    if let Some(color) = fill {
        ops.push(fill_color(color.fractions()));
    }
    if let Some(color) = stroke {
        ops.push(stroke_color(color.fractions()));
        ops.push(Operation::new("w", vec![real(stroke_width * space.sx)]));
    }
    Ok(Some(paint_op))
}

fn ellipse_path(cx: f32, cy: f32, rx: f32, ry: f32) -> Vec<Operation> {
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let curve = |points: [f32; 6]| Operation::new("c", points.into_iter().map(real).collect());
    vec![
        Operation::new("m", vec![real(cx + rx), real(cy)]),
        curve([cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry]),
        curve([cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy]),
        curve([cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry]),
        curve([cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy]),
        Operation::new("h", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{page_labels, page_operators, page_strings, sample_pdf, sample_png};
    use crate::traits::RecognizedWord;
    use folio_core::{Color, Point};

    fn rotation_of(pdf: &[u8], index: usize) -> i64 {
        let doc = pages::load(pdf).unwrap();
        let page = pages::page_id(&doc, index).unwrap();
        match pages::inherited_attribute(&doc, page, b"Rotate") {
            Some(Object::Integer(value)) => value,
            _ => 0,
        }
    }

    #[test]
    fn merge_preserves_order() {
        let engine = LopdfEngine::new();
        let (first, second) = (sample_pdf(2), sample_pdf(3));
        let merged = engine.merge(&[first.as_slice(), second.as_slice()]).unwrap();
        assert_eq!(
            page_labels(&merged),
            vec!["Page 1", "Page 2", "Page 1", "Page 2", "Page 3"]
        );
        assert_eq!(engine.page_count(&merged).unwrap(), 5);
    }

    #[test]
    fn merge_of_nothing_is_an_error() {
        assert!(LopdfEngine::new().merge(&[]).is_err());
    }

    #[test]
    fn select_pages_follows_requested_order() {
        let engine = LopdfEngine::new();
        let selected = engine.select_pages(&sample_pdf(4), &[2, 0, 2, 9]).unwrap();
        assert_eq!(page_labels(&selected), vec!["Page 3", "Page 1"]);
    }

    #[test]
    fn select_pages_rejects_empty_selection() {
        let engine = LopdfEngine::new();
        assert!(engine.select_pages(&sample_pdf(2), &[7]).is_err());
        assert!(engine.select_pages(&sample_pdf(2), &[]).is_err());
    }

    #[test]
    fn rotation_accumulates() {
        let engine = LopdfEngine::new();
        let once = engine.rotate_pages(&sample_pdf(2), 90).unwrap();
        let twice = engine.rotate_pages(&once, 180).unwrap();
        assert_eq!(rotation_of(&twice, 0), 270);
        let back = engine.rotate_pages(&twice, -270).unwrap();
        assert_eq!(rotation_of(&back, 1), 0);
    }

    #[test]
    fn rotation_must_be_quarter_turns() {
        let err = LopdfEngine::new().rotate_pages(&sample_pdf(1), 45).unwrap_err();
        assert!(matches!(err, FolioError::InvalidOption { .. }));
    }

    #[test]
    fn compress_and_repair_keep_pages() {
        let engine = LopdfEngine::new();
        let pdf = sample_pdf(3);
        assert_eq!(page_labels(&engine.compress(&pdf).unwrap()), page_labels(&pdf));
        assert_eq!(page_labels(&engine.repair(&pdf).unwrap()), page_labels(&pdf));
    }

    #[test]
    fn watermark_is_stamped_on_every_page() {
        let engine = LopdfEngine::new();
        let stamp = TextStamp {
            text: "DRAFT".into(),
            font_size: 50.0,
            color: Color::rgb(128, 128, 128),
            opacity: 0.5,
            rotation_degrees: 45.0,
            anchor: Anchor::Centre { dx: -100.0, dy: 0.0 },
        };
        let stamped = engine.stamp_text(&sample_pdf(2), &stamp).unwrap();
        for strings in page_strings(&stamped) {
            assert!(strings.contains(&"DRAFT".to_string()));
        }
        assert!(page_operators(&stamped, 1).contains(&"gs".to_string()));
    }

    #[test]
    fn page_numbers_count_from_start() {
        let engine = LopdfEngine::new();
        let style = PageNumberStyle {
            start: 5,
            position: NumberPosition::BottomRight,
        };
        let numbered = engine.number_pages(&sample_pdf(3), &style).unwrap();
        let strings = page_strings(&numbered);
        assert!(strings[0].contains(&"5".to_string()));
        assert!(strings[2].contains(&"7".to_string()));
    }

    #[test]
    fn number_origin_respects_position() {
        let page = (0.0, 0.0, 612.0, 792.0);
        let (x, y) = number_origin(NumberPosition::BottomCenter, page, 12.0);
        assert_eq!((x, y), (300.0, PAGE_NUMBER_MARGIN));
        let (x, y) = number_origin(NumberPosition::TopLeft, page, 12.0);
        assert_eq!(x, PAGE_NUMBER_MARGIN);
        assert!(y > 700.0);
    }

    #[test]
    fn image_stamp_lands_on_requested_page() {
        let engine = LopdfEngine::new();
        let stamp = ImageStamp {
            image: sample_png(30, 15, [0, 0, 0, 255]),
            page_index: 1,
            x: 50.0,
            y: 50.0,
            width: 150.0,
            height: 75.0,
        };
        let stamped = engine.stamp_image(&sample_pdf(2), &stamp).unwrap();
        assert!(page_operators(&stamped, 2).contains(&"Do".to_string()));
        assert!(!page_operators(&stamped, 1).contains(&"Do".to_string()));
    }

    #[test]
    fn overlays_touch_only_their_pages() {
        let engine = LopdfEngine::new();
        let mut snapshot = OverlaySnapshot::new(918, 1188);
        snapshot.objects.push(OverlayObject::text("Hello"));
        snapshot.objects.push(OverlayObject::rect());
        snapshot.objects.push(OverlayObject::ellipse());
        snapshot.objects.push(OverlayObject::path(vec![Point::new(1.0, 1.0), Point::new(20.0, 30.0)]));
        let mut layer = AnnotationLayer::new();
        layer.insert(2, snapshot);
        layer.insert(9, OverlaySnapshot::new(918, 1188));

        let edited = engine.apply_overlays(&sample_pdf(3), &layer).unwrap();
        let strings = page_strings(&edited);
        assert!(strings[1].contains(&"Hello".to_string()));
        assert!(!strings[0].contains(&"Hello".to_string()));
        let ops = page_operators(&edited, 2);
        for expected in ["re", "c", "l", "S"] {
            assert!(ops.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn page_space_flips_and_scales() {
        let space = PageSpace::new((0.0, 0.0, 612.0, 792.0), &OverlaySnapshot::new(918, 1188));
        assert!((space.x(918.0) - 612.0).abs() < 1e-3);
        assert!((space.y(0.0) - 792.0).abs() < 1e-3);
        assert!((space.y(1188.0)).abs() < 1e-3);
    }

    #[test]
    fn invisible_shapes_emit_nothing() {
        let mut doc = pages::load(&sample_pdf(1)).unwrap();
        let page = pages::page_id(&doc, 0).unwrap();
        let space = PageSpace::new(pages::page_box(&doc, page), &OverlaySnapshot::new(100, 100));
        let rect = OverlayObject::Rect {
            left: 0.0,
            top: 0.0,
            width: 10.0,
            height: 10.0,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
        };
        assert!(overlay_operations(&mut doc, page, &space, &rect).unwrap().is_empty());
    }

    #[test]
    fn text_layer_is_invisible_but_present() {
        let engine = LopdfEngine::new();
        let recognized = vec![RecognizedPage {
            page_index: 0,
            image_width: 1224,
            image_height: 1584,
            words: vec![RecognizedWord {
                text: "invoice".into(),
                left: 100.0,
                top: 100.0,
                width: 140.0,
                height: 30.0,
                confidence: None,
            }],
        }];
        let searchable = engine.add_text_layer(&sample_pdf(1), &recognized).unwrap();
        assert!(page_strings(&searchable)[0].contains(&"invoice".to_string()));
        assert!(page_operators(&searchable, 1).contains(&"Tr".to_string()));
    }

    #[test]
    fn images_become_pages_of_their_size() {
        let engine = LopdfEngine::new();
        let images: Vec<DynamicImage> = [(200, 100), (50, 80)]
            .iter()
            .map(|&(w, h)| ::image::load_from_memory(&sample_png(w, h, [10, 20, 30, 255])).unwrap())
            .collect();
        let pdf = engine.images_to_pdf(&images).unwrap();
        let doc = pages::load(&pdf).unwrap();
        let second = pages::page_id(&doc, 1).unwrap();
        assert_eq!(pages::page_box(&doc, second), (0.0, 0.0, 50.0, 80.0));
        assert!(engine.images_to_pdf(&[]).is_err());
    }

    #[test]
    fn unencrypted_documents_unlock_unchanged() {
        let engine = LopdfEngine::new();
        let pdf = sample_pdf(2);
        assert_eq!(page_labels(&engine.unlock(&pdf, "").unwrap()), page_labels(&pdf));
    }

    #[test]
    fn protected_documents_unlock_with_their_password() {
        let engine = LopdfEngine::new();
        let pdf = sample_pdf(3);
        let protected = engine.protect(&pdf, "secret").unwrap();
        assert!(pages::load(&protected).unwrap().is_encrypted());

        let unlocked = engine.unlock(&protected, "secret").unwrap();
        let doc = pages::load(&unlocked).unwrap();
        assert!(!doc.is_encrypted());
        assert_eq!(engine.page_count(&unlocked).unwrap(), 3);
        assert_eq!(page_labels(&unlocked), page_labels(&pdf));
    }

    #[test]
    fn wrong_password_is_refused() {
        let engine = LopdfEngine::new();
        let protected = engine.protect(&sample_pdf(1), "secret").unwrap();
        let err = engine.unlock(&protected, "guess").unwrap_err();
        assert!(matches!(err, FolioError::Precondition(ref msg) if msg == "That password does not open this PDF."));
    }

    #[test]
    fn protecting_twice_is_unsupported() {
        let engine = LopdfEngine::new();
        let protected = engine.protect(&sample_pdf(1), "secret").unwrap();
        assert!(matches!(
            engine.protect(&protected, "other"),
            Err(FolioError::UnsupportedDocument(_))
        ));
    }
}
