// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine capability contracts.
//
// Each trait is the narrow interface one capability exposes to the tools.
// Implementations live in this crate (lopdf, printpdf, zip, quick-xml, image,
// optionally pdfium and ocrs) and are installed into the pipeline's capability
// registry by the host.

use folio_core::{AnnotationLayer, Color, NumberPosition, OverlayObject, OverlaySnapshot, Result};
use image::{DynamicImage, RgbaImage};

// -- Document model -----------------------------------------------------------

/// Where a text stamp is anchored on each page, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Offset from the page centre.
    Centre { dx: f32, dy: f32 },
    /// Absolute position from the bottom-left corner.
    Absolute { x: f32, y: f32 },
}

/// Text drawn onto every page of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStamp {
    pub text: String,
    pub font_size: f32,
    pub color: Color,
    pub opacity: f32,
    /// Counter-clockwise rotation of the baseline.
    pub rotation_degrees: f32,
    pub anchor: Anchor,
}

/// A raster image drawn onto one page, in PDF points from the bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStamp {
    /// Encoded image (PNG or JPEG).
    pub image: Vec<u8>,
    /// Zero-based page index.
    pub page_index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumberStyle {
    pub start: u32,
    pub position: NumberPosition,
}

/// One recognized word in image pixel coordinates (top-left origin).
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedWord {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    /// Engine confidence in 0.0..=1.0, when the engine reports one.
    pub confidence: Option<f32>,
}

/// Recognition results for one rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedPage {
    /// Zero-based page index.
    pub page_index: usize,
    pub image_width: u32,
    pub image_height: u32,
    pub words: Vec<RecognizedWord>,
}

/// Open, edit and serialize PDF documents.
pub trait DocumentEngine: Send + Sync {
    fn page_count(&self, pdf: &[u8]) -> Result<u32>;

    /// Concatenate documents in the given order.
    fn merge(&self, documents: &[&[u8]]) -> Result<Vec<u8>>;

    /// Build a document from the given zero-based page indices, in that order.
    /// Out-of-range indices are skipped and duplicates keep their first position.
    fn select_pages(&self, pdf: &[u8], indices: &[usize]) -> Result<Vec<u8>>;

    /// Add `degrees` (a multiple of 90) to every page's rotation.
    fn rotate_pages(&self, pdf: &[u8], degrees: i32) -> Result<Vec<u8>>;

    fn compress(&self, pdf: &[u8]) -> Result<Vec<u8>>;

    /// Load leniently and write a clean copy.
    fn repair(&self, pdf: &[u8]) -> Result<Vec<u8>>;

    fn stamp_text(&self, pdf: &[u8], stamp: &TextStamp) -> Result<Vec<u8>>;

    fn number_pages(&self, pdf: &[u8], style: &PageNumberStyle) -> Result<Vec<u8>>;

    fn stamp_image(&self, pdf: &[u8], stamp: &ImageStamp) -> Result<Vec<u8>>;

    /// Merge per-page overlays into the page content. Pages without an entry
    /// are left untouched.
    fn apply_overlays(&self, pdf: &[u8], layer: &AnnotationLayer) -> Result<Vec<u8>>;

    /// Add an invisible, selectable text layer from recognition results.
    fn add_text_layer(&self, pdf: &[u8], pages: &[RecognizedPage]) -> Result<Vec<u8>>;

    /// One page per image, each page sized to its image.
    fn images_to_pdf(&self, images: &[DynamicImage]) -> Result<Vec<u8>>;

    fn protect(&self, pdf: &[u8], password: &str) -> Result<Vec<u8>>;

    fn unlock(&self, pdf: &[u8], password: &str) -> Result<Vec<u8>>;
}

// -- Rendering ----------------------------------------------------------------

/// Rasterize pages and extract their text.
///
/// Every render call returns a freshly owned surface; callers render pages one
/// after another and never share a surface between calls.
pub trait RenderEngine: Send + Sync {
    /// One-time configuration with a worker/library location.
    fn configure_worker(&self, _source: &str) -> Result<()> {
        Ok(())
    }

    fn page_count(&self, pdf: &[u8]) -> Result<u32>;

    /// Text items of a 1-based page, in content order.
    fn page_text(&self, pdf: &[u8], page_number: u32) -> Result<Vec<String>>;

    /// Render a 1-based page at `scale` (1.0 = 72 dpi).
    fn render_page(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<RgbaImage>;

    /// Render every page in order, handing each surface to `each`.
    fn render_pages(
        &self,
        pdf: &[u8],
        scale: f32,
        each: &mut dyn FnMut(u32, RgbaImage) -> Result<()>,
    ) -> Result<()> {
        let total = self.page_count(pdf)?;
        for page_number in 1..=total {
            let surface = self.render_page(pdf, page_number, scale)?;
            each(page_number, surface)?;
        }
        Ok(())
    }
}

// -- Text recognition ---------------------------------------------------------

pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, page: &DynamicImage) -> Result<Vec<RecognizedWord>>;
}

// -- Annotation canvas --------------------------------------------------------

/// A drawable overlay surface bound to one page at a time.
pub trait OverlayCanvas: Send {
    fn dimensions(&self) -> (u32, u32);

    /// Replace the background and resize the canvas to match it.
    fn set_background(&mut self, background: RgbaImage);

    /// Remove every overlay object; the background stays.
    fn clear(&mut self);

    fn add(&mut self, object: OverlayObject);

    fn objects(&self) -> &[OverlayObject];

    fn to_snapshot(&self) -> OverlaySnapshot;

    /// Replace the overlay objects with those of `snapshot`.
    fn load_snapshot(&mut self, snapshot: &OverlaySnapshot);

    /// Background plus every object, flattened.
    fn to_image(&self) -> Result<RgbaImage>;
}

pub trait CanvasEngine: Send + Sync {
    fn create_canvas(&self, width: u32, height: u32) -> Box<dyn OverlayCanvas>;
}

// -- Page layout --------------------------------------------------------------

pub trait PageLayout: Send + Sync {
    /// Lay out paragraphs top to bottom, breaking pages as needed.
    fn text_document(&self, title: &str, paragraphs: &[String]) -> Result<Vec<u8>>;
}

// -- Office formats -----------------------------------------------------------

pub trait OfficeReader: Send + Sync {
    /// Paragraph texts of a word-processing document, in order.
    fn paragraphs(&self, document: &[u8]) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

pub trait SpreadsheetReader: Send + Sync {
    fn sheets(&self, workbook: &[u8]) -> Result<Vec<Sheet>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideImage {
    /// PNG-encoded slide picture.
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub trait PresentationWriter: Send + Sync {
    /// One full-bleed picture slide per image.
    fn image_slides(&self, slides: &[SlideImage]) -> Result<Vec<u8>>;
}

// -- Archives and rasters -----------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

pub trait ArchiveWriter: Send + Sync {
    fn pack(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>>;
}

pub trait RasterDecoder: Send + Sync {
    /// Decode every frame of a (possibly multi-page) raster file.
    fn decode_frames(&self, data: &[u8]) -> Result<Vec<DynamicImage>>;
}
