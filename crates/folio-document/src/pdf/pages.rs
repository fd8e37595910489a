// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-tree helpers shared by the lopdf engine: loading, saving, inherited
// attributes, cross-document page cloning, and flat page-tree rebuilding.

use std::collections::{BTreeMap, HashMap, HashSet};

use folio_core::error::{FolioError, Result};
use lopdf::xref::XrefEntry;
use lopdf::{Dictionary, Document, Object, ObjectId, Reader};
use tracing::warn;

/// Attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic /Parent chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// US Letter, used when a page carries no usable /MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

pub(crate) fn load(pdf: &[u8]) -> Result<Document> {
    Document::load_mem(pdf)
        .map_err(|err| FolioError::PdfError(format!("failed to load PDF from memory: {}", err)))
}

pub(crate) fn save(doc: &mut Document, what: &str) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| FolioError::PdfError(format!("failed to serialise {}: {}", what, err)))?;
    Ok(output)
}

/// Re-read every stored object of an encrypted file, still encrypted.
///
/// `Document::load_mem` only keeps the objects of an encrypted file when the
/// empty user password opens it; otherwise the document arrives with just its
/// trailer, cross-reference table and /Encrypt dictionary.
pub(crate) fn load_stored_objects(doc: Document, pdf: &[u8]) -> Document {
    let ids: Vec<ObjectId> = doc
        .reference_table
        .entries
        .iter()
        .filter_map(|(&number, entry)| match *entry {
            XrefEntry::Normal { generation, .. } => Some((number, generation)),
            _ => None,
        })
        .collect();

    // Offsets are relative to the header, as in the loader.
    let start = pdf.windows(5).position(|window| window == b"%PDF-").unwrap_or(0);
    let reader = Reader {
        buffer: &pdf[start..],
        document: doc,
        encryption_state: None,
        raw_objects: BTreeMap::new(),
    };

    let mut objects = BTreeMap::new();
    for id in ids {
        match reader.get_object(id, &mut HashSet::new()) {
            Ok(object) => {
                objects.insert(id, object);
            }
            Err(err) => warn!(object = ?id, error = %err, "Skipping unreadable object"),
        }
    }

    let mut doc = reader.document;
    for (id, object) in objects {
        doc.objects.entry(id).or_insert(object);
    }
    doc
}

/// Page object ids in page order.
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

pub(crate) fn page_id(doc: &Document, index: usize) -> Result<ObjectId> {
    let ids = page_ids(doc);
    ids.get(index).copied().ok_or_else(|| {
        FolioError::PdfError(format!(
            "page {} out of range (document has {} pages)",
            index + 1,
            ids.len()
        ))
    })
}

/// Object id of the root /Pages node.
pub(crate) fn pages_root(doc: &Document) -> Result<ObjectId> {
    let catalog = doc
        .catalog()
        .map_err(|err| FolioError::PdfError(format!("no catalog: {}", err)))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|err| FolioError::PdfError(format!("no /Pages reference: {}", err)))
}

/// Resolve one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Look up `key` on the page or, failing that, on its nearest ancestor.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Page size in points as `(x0, y0, width, height)` from the effective /MediaBox.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox");
    let values: Option<Vec<f32>> = media_box.as_ref().and_then(|object| {
        match resolve(doc, object) {
            Object::Array(items) if items.len() == 4 => {
                items.iter().map(|item| number(resolve(doc, item))).collect()
            }
            _ => None,
        }
    });
    match values.as_deref() {
        Some([x0, y0, x1, y1]) => {
            let width = (x1 - x0).abs();
            let height = (y1 - y0).abs();
            if width > 0.0 && height > 0.0 {
                return (x0.min(*x1), y0.min(*y1), width, height);
            }
            (0.0, 0.0, DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1)
        }
        _ => (0.0, 0.0, DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1),
    }
}

/// Copy inherited attributes onto the page itself so it survives re-parenting.
pub(crate) fn localize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let mut missing = Vec::new();
    {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|err| FolioError::PdfError(format!("cannot read page {:?}: {}", page_id, err)))?;
        for key in INHERITABLE {
            if !page.has(key) {
                missing.push(key);
            }
        }
    }
    let values: Vec<(&[u8], Object)> = missing
        .into_iter()
        .filter_map(|key| inherited_attribute(doc, page_id, key).map(|value| (key, value)))
        .collect();
    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|err| FolioError::PdfError(format!("cannot update page {:?}: {}", page_id, err)))?;
    for (key, value) in values {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

/// Replace the page tree with a single flat /Pages node listing `pages` in order.
///
/// Pages no longer listed become unreachable and are dropped by the caller's
/// `prune_objects` pass.
pub(crate) fn rebuild_page_tree(doc: &mut Document, pages: &[ObjectId]) -> Result<()> {
    let root = pages_root(doc)?;
    for &page in pages {
        localize_inherited(doc, page)?;
    }
    for &page in pages {
        if let Ok(dict) = doc.get_dictionary_mut(page) {
            dict.set("Parent", Object::Reference(root));
        }
    }
    let root_dict = doc
        .get_dictionary_mut(root)
        .map_err(|err| FolioError::PdfError(format!("invalid /Pages node: {}", err)))?;
    root_dict.set(
        "Kids",
        Object::Array(pages.iter().map(|&id| Object::Reference(id)).collect()),
    );
    root_dict.set("Count", Object::Integer(pages.len() as i64));
    // Attributes on the old root would otherwise leak into every page.
    for key in INHERITABLE {
        root_dict.remove(key);
    }
    Ok(())
}

// -- Cross-document cloning ---------------------------------------------------

/// Copies pages from one document into another, sharing resources that several
/// pages reference.
pub(crate) struct PageCloner<'a> {
    source: &'a Document,
    mapped: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCloner<'a> {
    pub(crate) fn new(source: &'a Document) -> Self {
        Self {
            source,
            mapped: HashMap::new(),
        }
    }

    /// Clone a page (and everything it references) into `target`, appending it
    /// as the last page of `target`'s root page node.
    pub(crate) fn append_page(&mut self, target: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
        let source = self.source;
        let page = source.get_dictionary(page_id).map_err(|err| {
            FolioError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
        })?;

        let mut cloned = Dictionary::new();
        for (key, value) in page.iter() {
            if key == b"Parent" {
                continue;
            }
            cloned.set(key.clone(), self.clone_object(target, value));
        }
        for key in INHERITABLE {
            if !cloned.has(key) {
                if let Some(value) = inherited_attribute(source, page_id, key) {
                    cloned.set(key.to_vec(), self.clone_object(target, &value));
                }
            }
        }

        let root = pages_root(target)?;
        cloned.set("Parent", Object::Reference(root));
        let new_id = target.add_object(Object::Dictionary(cloned));
        self.mapped.insert(page_id, new_id);

        let root_dict = target
            .get_dictionary_mut(root)
            .map_err(|err| FolioError::PdfError(format!("invalid /Pages node: {}", err)))?;
        if !matches!(root_dict.get(b"Kids"), Ok(Object::Array(_))) {
            root_dict.set("Kids", Object::Array(Vec::new()));
        }
        if let Ok(Object::Array(kids)) = root_dict.get_mut(b"Kids") {
            kids.push(Object::Reference(new_id));
        }
        let count = root_dict.get(b"Count").ok().and_then(number).unwrap_or(0.0) as i64;
        root_dict.set("Count", Object::Integer(count + 1));
        Ok(new_id)
    }

    fn clone_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items.iter().map(|item| self.clone_object(target, item)).collect(),
            ),
            Object::Stream(stream) => {
                let dict = self.clone_dictionary(target, &stream.dict);
                Object::Stream(lopdf::Stream::new(dict, stream.content.clone()))
            }
            Object::Reference(id) => self.clone_reference(target, *id),
            other => other.clone(),
        }
    }

    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut cloned = Dictionary::new();
        for (key, value) in dict.iter() {
            // Back-references into the page tree are patched by the caller.
            if key == b"Parent" || key == b"P" {
                continue;
            }
            cloned.set(key.clone(), self.clone_object(target, value));
        }
        cloned
    }

    fn clone_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(mapped) = self.mapped.get(&id) {
            return Object::Reference(*mapped);
        }
        let source = self.source;
        let Ok(referenced) = source.get_object(id) else {
            warn!(?id, "Cannot resolve reference, using Null");
            return Object::Null;
        };
        // Reserve the id first so cycles resolve to the same object.
        let new_id = target.new_object_id();
        self.mapped.insert(id, new_id);
        let cloned = self.clone_object(target, referenced);
        target.objects.insert(new_id, cloned);
        Object::Reference(new_id)
    }
}
