// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation canvas: keeps overlay objects as vectors and flattens them onto
// the page background with `imageproc` when a raster is needed.

use folio_core::error::{FolioError, Result};
use folio_core::{Color, OverlayObject, OverlaySnapshot, Point};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_ellipse_mut, draw_filled_rect_mut, draw_hollow_ellipse_mut,
    draw_line_segment_mut,
};
use imageproc::rect::Rect;
use tracing::debug;

use crate::traits::{CanvasEngine, OverlayCanvas};

/// Canvas holding a background surface and a list of overlay objects.
pub struct VectorCanvas {
    background: RgbaImage,
    objects: Vec<OverlayObject>,
}

impl VectorCanvas {
    /// A transparent canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            background: RgbaImage::new(width, height),
            objects: Vec::new(),
        }
    }
}

impl OverlayCanvas for VectorCanvas {
    fn dimensions(&self) -> (u32, u32) {
        self.background.dimensions()
    }

    fn set_background(&mut self, background: RgbaImage) {
        self.background = background;
    }

    fn clear(&mut self) {
        self.objects.clear();
    }

    fn add(&mut self, object: OverlayObject) {
        self.objects.push(object);
    }

    fn objects(&self) -> &[OverlayObject] {
        &self.objects
    }

    fn to_snapshot(&self) -> OverlaySnapshot {
        let (width, height) = self.dimensions();
        OverlaySnapshot {
            width,
            height,
            objects: self.objects.clone(),
        }
    }

    fn load_snapshot(&mut self, snapshot: &OverlaySnapshot) {
        self.objects = snapshot.objects.clone();
    }

    /// Text objects carry no glyph outlines here and are skipped; the document
    /// model draws them with a real font.
    fn to_image(&self) -> Result<RgbaImage> {
        let mut surface = self.background.clone();
        for object in &self.objects {
            draw_object(&mut surface, object)?;
        }
        debug!(objects = self.objects.len(), "Canvas flattened");
        Ok(surface)
    }
}

/// Creates [`VectorCanvas`] instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct VectorCanvasEngine;

impl CanvasEngine for VectorCanvasEngine {
    fn create_canvas(&self, width: u32, height: u32) -> Box<dyn OverlayCanvas> {
        Box::new(VectorCanvas::new(width, height))
    }
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

fn draw_object(surface: &mut RgbaImage, object: &OverlayObject) -> Result<()> {
    match object {
        OverlayObject::Text { .. } => {}
        OverlayObject::Rect { left, top, width, height, fill, stroke, stroke_width } => {
            let (x, y) = (left.round() as i32, top.round() as i32);
            let (w, h) = (width.round().max(1.0) as u32, height.round().max(1.0) as u32);
            if let Some(color) = fill {
                draw_filled_rect_mut(surface, Rect::at(x, y).of_size(w, h), rgba(*color));
            }
            if let Some(color) = stroke {
                let corners = [
                    Point::new(*left, *top),
                    Point::new(left + width, *top),
                    Point::new(left + width, top + height),
                    Point::new(*left, top + height),
                    Point::new(*left, *top),
                ];
                draw_polyline(surface, &corners, rgba(*color), *stroke_width);
            }
        }
        OverlayObject::Ellipse { left, top, rx, ry, fill, stroke, stroke_width } => {
            let centre = ((left + rx).round() as i32, (top + ry).round() as i32);
            let (rx, ry) = (rx.round() as i32, ry.round() as i32);
            if let Some(color) = fill {
                draw_filled_ellipse_mut(surface, centre, rx, ry, rgba(*color));
            }
            if let Some(color) = stroke {
                // Concentric outlines approximate the stroke width.
                let rings = stroke_width.round().max(1.0) as i32;
                for ring in 0..rings {
                    let offset = ring - rings / 2;
                    draw_hollow_ellipse_mut(surface, centre, rx + offset, ry + offset, rgba(*color));
                }
            }
        }
        OverlayObject::Path { points, stroke, stroke_width } => {
            draw_polyline(surface, points, rgba(*stroke), *stroke_width);
        }
        OverlayObject::Image { left, top, width, height, png } => {
            let picture = image::load_from_memory(png)
                .map_err(|err| FolioError::CanvasError(format!("failed to decode overlay image: {}", err)))?
                .resize_exact(
                    width.round().max(1.0) as u32,
                    height.round().max(1.0) as u32,
                    FilterType::Triangle,
                )
                .to_rgba8();
            imageops::overlay(surface, &picture, left.round() as i64, top.round() as i64);
        }
    }
    Ok(())
}

/// Stroke a polyline with round joins by stamping discs along each segment.
fn draw_polyline(surface: &mut RgbaImage, points: &[Point], color: Rgba<u8>, width: f32) {
    let radius = (width / 2.0).round() as i32;
    if radius <= 0 {
        for pair in points.windows(2) {
            draw_line_segment_mut(surface, (pair[0].x, pair[0].y), (pair[1].x, pair[1].y), color);
        }
        return;
    }
    let mut stamp = |p: &Point| draw_filled_circle_mut(surface, (p.x.round() as i32, p.y.round() as i32), radius, color);
    if let Some(first) = points.first() {
        stamp(first);
    }
    for pair in points.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let steps = (to.x - from.x).hypot(to.y - from.y).ceil().max(1.0) as usize;
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            stamp(&Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t));
        }
    }
}
