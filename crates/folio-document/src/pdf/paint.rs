// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Drawing onto existing pages: resource registration (fonts, graphics states,
// image XObjects) and appending content streams without disturbing the
// page's own graphics state.

use folio_core::error::{FolioError, Result};
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::pages;

/// Resource name under which the standard Helvetica font is registered.
const HELVETICA: &[u8] = b"FolioHelv";

/// Average Helvetica advance as a fraction of the font size.
const AVERAGE_ADVANCE: f32 = 0.5;

// -- Resources ----------------------------------------------------------------

/// The page's own /Resources dictionary, creating or localizing it as needed.
/// A shared (indirect) resource dictionary is edited in place.
fn resources_mut(doc: &mut Document, page_id: ObjectId) -> Result<&mut Dictionary> {
    pages::localize_inherited(doc, page_id)?;
    let page = doc
        .get_dictionary(page_id)
        .map_err(|err| FolioError::PdfError(format!("cannot read page {:?}: {}", page_id, err)))?;
    let shared = match page.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    if let Some(id) = shared {
        return doc
            .get_dictionary_mut(id)
            .map_err(|err| FolioError::PdfError(format!("invalid /Resources: {}", err)));
    }

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|err| FolioError::PdfError(format!("cannot update page {:?}: {}", page_id, err)))?;
    if !matches!(page.get(b"Resources"), Ok(Object::Dictionary(_))) {
        page.set("Resources", Object::Dictionary(Dictionary::new()));
    }
    match page.get_mut(b"Resources") {
        Ok(Object::Dictionary(resources)) => Ok(resources),
        _ => Err(FolioError::PdfError("page has no usable /Resources".into())),
    }
}

/// One resource category (`/Font`, `/XObject`, `/ExtGState`) of the page.
fn category_mut<'a>(doc: &'a mut Document, page_id: ObjectId, category: &[u8]) -> Result<&'a mut Dictionary> {
    let shared = match resources_mut(doc, page_id)?.get(category) {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    if let Some(id) = shared {
        return doc.get_dictionary_mut(id).map_err(|err| {
            FolioError::PdfError(format!("invalid /{} resources: {}", String::from_utf8_lossy(category), err))
        });
    }

    let resources = resources_mut(doc, page_id)?;
    if !matches!(resources.get(category), Ok(Object::Dictionary(_))) {
        resources.set(category.to_vec(), Object::Dictionary(Dictionary::new()));
    }
    match resources.get_mut(category) {
        Ok(Object::Dictionary(dict)) => Ok(dict),
        _ => Err(FolioError::PdfError("resource category is not a dictionary".into())),
    }
}

/// Register `object_id` under the first free `<prefix><n>` name.
fn register(doc: &mut Document, page_id: ObjectId, category: &[u8], prefix: &str, object_id: ObjectId) -> Result<Vec<u8>> {
    let dict = category_mut(doc, page_id, category)?;
    let name = (0..)
        .map(|n| format!("{prefix}{n}").into_bytes())
        .find(|candidate| !dict.has(candidate))
        .unwrap_or_else(|| prefix.as_bytes().to_vec());
    dict.set(name.clone(), Object::Reference(object_id));
    Ok(name)
}

/// Make the standard Helvetica font available on the page.
pub(crate) fn helvetica(doc: &mut Document, page_id: ObjectId) -> Result<Vec<u8>> {
    if category_mut(doc, page_id, b"Font")?.has(HELVETICA) {
        return Ok(HELVETICA.to_vec());
    }
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    category_mut(doc, page_id, b"Font")?.set(HELVETICA.to_vec(), Object::Reference(font_id));
    Ok(HELVETICA.to_vec())
}

/// A graphics state with the given fill and stroke opacity.
pub(crate) fn opacity_state(doc: &mut Document, page_id: ObjectId, fill: f32, stroke: f32) -> Result<Vec<u8>> {
    let state_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"ExtGState".to_vec())),
        ("ca", Object::Real(fill.clamp(0.0, 1.0))),
        ("CA", Object::Real(stroke.clamp(0.0, 1.0))),
    ]));
    register(doc, page_id, b"ExtGState", "FolioGs", state_id)
}

/// Add `image` to the document as an RGB image XObject, with a soft mask when
/// it carries transparency.
pub(crate) fn add_image(doc: &mut Document, image: &DynamicImage) -> ObjectId {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel.0[3]);
    }

    let mut dict = image_dictionary(width, height, b"DeviceRGB");
    if alpha.iter().any(|&a| a < u8::MAX) {
        let mask_id = doc.add_object(Stream::new(image_dictionary(width, height, b"DeviceGray"), alpha));
        dict.set("SMask", Object::Reference(mask_id));
    }
    doc.add_object(Stream::new(dict, rgb))
}

fn image_dictionary(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(color_space.to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ])
}

/// Register an image XObject on the page and return its resource name.
pub(crate) fn image_xobject(doc: &mut Document, page_id: ObjectId, image: &DynamicImage) -> Result<Vec<u8>> {
    let image_id = add_image(doc, image);
    register(doc, page_id, b"XObject", "FolioImg", image_id)
}

// -- Content ------------------------------------------------------------------

/// Append `operations` to the page, drawn on top of the existing content.
///
/// The existing streams are bracketed by `q`/`Q` so whatever graphics state
/// they leave behind cannot leak into the appended drawing.
pub(crate) fn append_content(doc: &mut Document, page_id: ObjectId, operations: Vec<Operation>) -> Result<()> {
    let mut wrapped = Vec::with_capacity(operations.len() + 2);
    wrapped.push(Operation::new("q", vec![]));
    wrapped.extend(operations);
    wrapped.push(Operation::new("Q", vec![]));
    let overlay_id = add_content_stream(doc, wrapped)?;

    let existing = doc
        .get_dictionary(page_id)
        .map_err(|err| FolioError::PdfError(format!("cannot read page {:?}: {}", page_id, err)))?
        .get(b"Contents")
        .ok()
        .cloned();
    let existing: Vec<Object> = match existing {
        Some(Object::Array(items)) => items,
        Some(reference @ Object::Reference(_)) => {
            // A reference may point at a stream or at an array of streams.
            match pages::resolve(doc, &reference) {
                Object::Array(items) => items.clone(),
                _ => vec![reference],
            }
        }
        _ => Vec::new(),
    };

    let contents = if existing.is_empty() {
        vec![Object::Reference(overlay_id)]
    } else {
        let save_id = add_content_stream(doc, vec![Operation::new("q", vec![])])?;
        let restore_id = add_content_stream(doc, vec![Operation::new("Q", vec![])])?;
        let mut contents = Vec::with_capacity(existing.len() + 3);
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
        contents.push(Object::Reference(restore_id));
        contents.push(Object::Reference(overlay_id));
        contents
    };

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|err| FolioError::PdfError(format!("cannot update page {:?}: {}", page_id, err)))?;
    page.set("Contents", Object::Array(contents));
    Ok(())
}

fn add_content_stream(doc: &mut Document, operations: Vec<Operation>) -> Result<ObjectId> {
    let encoded = Content { operations }
        .encode()
        .map_err(|err| FolioError::PdfError(format!("failed to encode content stream: {}", err)))?;
    Ok(doc.add_object(Stream::new(Dictionary::new(), encoded)))
}

// -- Operation helpers --------------------------------------------------------

pub(crate) fn real(value: f32) -> Object {
    Object::Real(value)
}

pub(crate) fn name(value: &[u8]) -> Object {
    Object::Name(value.to_vec())
}

/// Encode text for a WinAnsi-encoded standard font. Characters outside
/// Latin-1 become `?`.
pub(crate) fn win_ansi(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    Object::String(bytes, lopdf::StringFormat::Literal)
}

/// Approximate rendered width of `text` in Helvetica at `font_size`.
pub(crate) fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * AVERAGE_ADVANCE * font_size
}

pub(crate) fn fill_color(rgb: [f32; 3]) -> Operation {
    Operation::new("rg", rgb.iter().copied().map(real).collect())
}

pub(crate) fn stroke_color(rgb: [f32; 3]) -> Operation {
    Operation::new("RG", rgb.iter().copied().map(real).collect())
}

/// Text matrix for a baseline at `(x, y)` rotated counter-clockwise.
pub(crate) fn text_matrix(x: f32, y: f32, rotation_degrees: f32) -> Operation {
    let (sin, cos) = rotation_degrees.to_radians().sin_cos();
    Operation::new("Tm", vec![real(cos), real(sin), real(-sin), real(cos), real(x), real(y)])
}

/// Place a unit-square XObject at `(x, y)` scaled to `width` by `height`.
pub(crate) fn draw_xobject(name: &[u8], x: f32, y: f32, width: f32, height: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("cm", vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)]),
        Operation::new("Do", vec![self::name(name)]),
        Operation::new("Q", vec![]),
    ]
}
