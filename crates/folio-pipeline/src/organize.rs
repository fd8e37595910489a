// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Organize sub-editor: a grid of page thumbnails the user reorders and prunes.

use folio_core::PageThumbnail;
use folio_core::error::Result;
use folio_document::ImageProcessor;
use folio_document::traits::RenderEngine;
use image::RgbaImage;
use tracing::{debug, info, instrument};

/// Thumbnails in on-screen order.
#[derive(Debug, Clone, Default)]
pub struct PageOrganizer {
    pages: Vec<PageThumbnail>,
}

impl PageOrganizer {
    /// Render every page at `scale`, one after another. Ids run 1..N.
    #[instrument(skip_all, fields(bytes_len = pdf.len(), scale))]
    pub fn from_document(renderer: &dyn RenderEngine, pdf: &[u8], scale: f32) -> Result<Self> {
        let mut pages = Vec::new();
        renderer.render_pages(pdf, scale, &mut |page_number: u32, surface: RgbaImage| {
            let (width, height) = surface.dimensions();
            let preview = ImageProcessor::from_rgba(surface).to_png_bytes()?;
            pages.push(PageThumbnail {
                id: page_number,
                preview: preview.into(),
                original_index: (page_number - 1) as usize,
                width,
                height,
            });
            Ok(())
        })?;
        info!(pages = pages.len(), "Organizer loaded");
        Ok(Self { pages })
    }

    pub fn from_thumbnails(pages: Vec<PageThumbnail>) -> Self {
        Self { pages }
    }

    /// Move the thumbnail at `from` to `to`. An out-of-range `from` does
    /// nothing; `to` is clamped to the last position.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.pages.len() {
            return;
        }
        let page = self.pages.remove(from);
        let to = to.min(self.pages.len());
        self.pages.insert(to, page);
        debug!(from, to, "Page moved");
    }

    /// Remove the thumbnail with `id`. Returns whether one was removed.
    pub fn delete(&mut self, id: u32) -> bool {
        let before = self.pages.len();
        self.pages.retain(|page| page.id != id);
        before != self.pages.len()
    }

    /// Zero-based source page indices in on-screen order.
    pub fn page_order(&self) -> Vec<usize> {
        self.pages.iter().map(|page| page.original_index).collect()
    }

    pub fn thumbnails(&self) -> &[PageThumbnail] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
