// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Signature pad for the sign tool.

use folio_core::error::{FolioError, Result};
use folio_core::{Point, ToolOptions};
use folio_document::ImageProcessor;
use folio_document::traits::{CanvasEngine, OverlayCanvas};
use image::{Rgba, RgbaImage};

pub const PAD_WIDTH: u32 = 300;
pub const PAD_HEIGHT: u32 = 150;

/// A small white canvas that collects freehand strokes.
pub struct SignaturePad {
    canvas: Box<dyn OverlayCanvas>,
}

impl SignaturePad {
    pub fn new(engine: &dyn CanvasEngine) -> Self {
        let mut canvas = engine.create_canvas(PAD_WIDTH, PAD_HEIGHT);
        canvas.set_background(RgbaImage::from_pixel(PAD_WIDTH, PAD_HEIGHT, Rgba([255, 255, 255, 255])));
        Self { canvas }
    }

    pub fn stroke(&mut self, points: Vec<Point>) {
        self.canvas.add(folio_core::OverlayObject::path(points));
    }

    pub fn is_blank(&self) -> bool {
        self.canvas.objects().is_empty()
    }

    /// Flatten the drawing to PNG and store it as the signature option.
    pub fn commit(&self, options: &mut ToolOptions) -> Result<()> {
        if self.is_blank() {
            return Err(FolioError::precondition("Please draw a signature."));
        }
        let png = ImageProcessor::from_rgba(self.canvas.to_image()?).to_png_bytes()?;
        options.signature_mut().image = Some(png.into());
        Ok(())
    }

    /// Wipe the pad and forget any committed signature.
    pub fn clear(&mut self, options: &mut ToolOptions) {
        self.canvas.clear();
        options.signature_mut().image = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_document::VectorCanvasEngine;

    #[test]
    fn commit_stores_a_png_of_the_pad() {
        let mut pad = SignaturePad::new(&VectorCanvasEngine);
        pad.stroke(vec![Point::new(10.0, 10.0), Point::new(120.0, 80.0)]);

        let mut options = ToolOptions::Empty;
        pad.commit(&mut options).unwrap();
        let png = options.signature().image.unwrap();
        let decoded = ImageProcessor::from_bytes(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (PAD_WIDTH, PAD_HEIGHT));
    }

    #[test]
    fn blank_pad_cannot_be_committed() {
        let pad = SignaturePad::new(&VectorCanvasEngine);
        let mut options = ToolOptions::Empty;
        assert!(matches!(pad.commit(&mut options), Err(FolioError::Precondition(_))));
        assert!(options.is_empty());
    }

    #[test]
    fn clear_resets_the_option() {
        let mut pad = SignaturePad::new(&VectorCanvasEngine);
        pad.stroke(vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]);
        let mut options = ToolOptions::Empty;
        pad.commit(&mut options).unwrap();
        pad.clear(&mut options);
        assert!(pad.is_blank());
        assert!(options.signature().image.is_none());
    }
}
