// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation sub-editor: one live canvas over the current page, plus the
// saved overlays of every page visited so far.
//
// Edits are only written into the layer on navigation or an explicit save.
// The layer is keyed by 1-based page number and belongs to the document
// whose fingerprint it was opened with.

use std::sync::Arc;

use folio_core::error::Result;
use folio_core::{AnnotationLayer, OverlayObject, Point};
use folio_document::ImageProcessor;
use folio_document::traits::{CanvasEngine, OverlayCanvas, RenderEngine};
use image::RgbaImage;
use tracing::{debug, info, instrument};

/// Which shape `add_shape` draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rect,
    Ellipse,
}

pub struct Annotator {
    pdf: Arc<[u8]>,
    fingerprint: String,
    renderer: Arc<dyn RenderEngine>,
    canvas: Box<dyn OverlayCanvas>,
    current: u32,
    total: u32,
    layer: AnnotationLayer,
    scale: f32,
}

impl Annotator {
    /// Open `pdf` on page 1, restoring any overlays already in `layer`.
    #[instrument(skip_all, fields(fingerprint = %fingerprint, scale))]
    pub fn open(
        renderer: Arc<dyn RenderEngine>,
        canvas_engine: &dyn CanvasEngine,
        pdf: Arc<[u8]>,
        fingerprint: String,
        scale: f32,
        layer: AnnotationLayer,
    ) -> Result<Self> {
        let total = renderer.page_count(&pdf)?;
        let mut annotator = Self {
            pdf,
            fingerprint,
            renderer,
            canvas: canvas_engine.create_canvas(1, 1),
            current: 1,
            total,
            layer,
            scale,
        };
        annotator.render_page(1)?;
        info!(total, restored = annotator.layer.len(), "Editor opened");
        Ok(annotator)
    }

    /// Show page `page_number` with its saved overlays, if any.
    pub fn render_page(&mut self, page_number: u32) -> Result<()> {
        let background = self.renderer.render_page(&self.pdf, page_number, self.scale)?;
        self.canvas.set_background(background);
        self.canvas.clear();
        if let Some(snapshot) = self.layer.get(&page_number) {
            self.canvas.load_snapshot(snapshot);
        }
        debug!(page_number, objects = self.canvas.objects().len(), "Page shown");
        Ok(())
    }

    /// Save the current page, then move by `delta` when the target page
    /// exists. The (possibly unchanged) current page is shown again.
    pub fn navigate(&mut self, delta: i32) -> Result<()> {
        self.save_current_page_edits();
        let target = i64::from(self.current) + i64::from(delta);
        if (1..=i64::from(self.total)).contains(&target) {
            self.current = target as u32;
        }
        self.render_page(self.current)
    }

    /// Store the canvas objects as the current page's overlay. An empty
    /// canvas removes the page's entry.
    pub fn save_current_page_edits(&mut self) {
        let snapshot = self.canvas.to_snapshot();
        if snapshot.is_empty() {
            self.layer.remove(&self.current);
        } else {
            self.layer.insert(self.current, snapshot);
        }
    }

    // -- Drawing helpers ------------------------------------------------------

    /// Add a text object; `None` uses the placeholder text.
    pub fn add_text(&mut self, text: Option<&str>) {
        self.canvas
            .add(OverlayObject::text(text.unwrap_or(OverlayObject::DEFAULT_TEXT)));
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.canvas.add(match shape {
            Shape::Rect => OverlayObject::rect(),
            Shape::Ellipse => OverlayObject::ellipse(),
        });
    }

    pub fn add_path(&mut self, points: Vec<Point>) {
        self.canvas.add(OverlayObject::path(points));
    }

    /// Place a picture at the insertion point, shrunk to fit the canvas.
    pub fn add_image(&mut self, png: &[u8]) -> Result<()> {
        let (canvas_width, canvas_height) = self.canvas.dimensions();
        let fitted = ImageProcessor::from_bytes(png)?.fit_within(canvas_width / 2, canvas_height / 2);
        self.canvas.add(OverlayObject::Image {
            left: 50.0,
            top: 50.0,
            width: fitted.width() as f32,
            height: fitted.height() as f32,
            png: png.to_vec(),
        });
        Ok(())
    }

    /// Drop every object on the live canvas.
    pub fn clear_page(&mut self) {
        self.canvas.clear();
    }

    // -- Accessors ------------------------------------------------------------

    pub fn current_page(&self) -> u32 {
        self.current
    }

    pub fn total_pages(&self) -> u32 {
        self.total
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn objects(&self) -> &[OverlayObject] {
        self.canvas.objects()
    }

    /// Saved overlays. Does not include unsaved edits on the live canvas.
    pub fn layer(&self) -> &AnnotationLayer {
        &self.layer
    }

    pub fn into_layer(self) -> AnnotationLayer {
        self.layer
    }

    /// The current page with its overlays flattened.
    pub fn preview(&self) -> Result<RgbaImage> {
        self.canvas.to_image()
    }
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("fingerprint", &self.fingerprint)
            .field("current", &self.current)
            .field("total", &self.total)
            .field("pages_annotated", &self.layer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_document::VectorCanvasEngine;
    use folio_document::test_utils::{FixtureRenderer, sample_pdf, sample_png};

    fn open(pages: u32) -> Annotator {
        let pdf: Arc<[u8]> = sample_pdf(pages).into();
        Annotator::open(
            Arc::new(FixtureRenderer),
            &VectorCanvasEngine,
            pdf,
            "fp".into(),
            1.0,
            AnnotationLayer::new(),
        )
        .unwrap()
    }

    #[test]
    fn opens_on_first_page() {
        let editor = open(3);
        assert_eq!(editor.current_page(), 1);
        assert_eq!(editor.total_pages(), 3);
        assert_eq!(editor.preview().unwrap().dimensions(), (612, 792));
    }

    #[test]
    fn navigation_saves_and_restores() {
        let mut editor = open(3);
        editor.add_text(None);
        editor.navigate(1).unwrap();
        assert_eq!(editor.current_page(), 2);
        assert!(editor.objects().is_empty());

        editor.navigate(-1).unwrap();
        assert_eq!(editor.current_page(), 1);
        assert!(matches!(
            editor.objects(),
            [OverlayObject::Text { text, .. }] if text == OverlayObject::DEFAULT_TEXT
        ));
        assert_eq!(editor.layer().keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn out_of_range_navigation_stays_put() {
        let mut editor = open(2);
        editor.navigate(-1).unwrap();
        assert_eq!(editor.current_page(), 1);
        editor.navigate(5).unwrap();
        assert_eq!(editor.current_page(), 1);
    }

    #[test]
    fn save_is_idempotent_and_empty_pages_drop_out() {
        let mut editor = open(2);
        editor.add_shape(Shape::Ellipse);
        editor.save_current_page_edits();
        let once = editor.layer().clone();
        editor.save_current_page_edits();
        assert_eq!(editor.layer(), &once);

        editor.clear_page();
        editor.save_current_page_edits();
        assert!(editor.layer().is_empty());
    }

    #[test]
    fn images_are_fitted_to_the_canvas() {
        let mut editor = open(1);
        editor.add_image(&sample_png(2000, 1000, [0, 0, 255, 255])).unwrap();
        match &editor.objects()[0] {
            OverlayObject::Image { width, height, .. } => {
                assert!(*width <= 306.0 && *height <= 396.0);
            }
            other => panic!("unexpected object: {other:?}"),
        }
    }
}
