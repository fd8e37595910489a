// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization and text extraction through pdfium.
//
// Only available with the `pdfium` feature. The pdfium shared library is
// bound on every call; the library location is configured once through
// `configure_worker` and otherwise taken from the system search path.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use folio_core::error::{FolioError, Result};
use image::RgbaImage;
use pdfium_render::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::traits::RenderEngine;

#[derive(Debug, Default)]
pub struct PdfiumRenderer {
    library: OnceLock<PathBuf>,
}

impl PdfiumRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configured library path, if any.
    pub fn library_path(&self) -> Option<&Path> {
        self.library.get().map(PathBuf::as_path)
    }

    fn bind(&self) -> Result<Pdfium> {
        let bindings = match self.library.get() {
            Some(path) => Pdfium::bind_to_library(path).map_err(|err| {
                FolioError::RenderError(format!("cannot bind pdfium at {}: {}", path.display(), err))
            })?,
            None => Pdfium::bind_to_system_library()
                .map_err(|err| FolioError::RenderError(format!("cannot bind system pdfium: {}", err)))?,
        };
        Ok(Pdfium::new(bindings))
    }

    fn with_document<T>(
        &self,
        pdf: &[u8],
        body: impl FnOnce(&PdfDocument<'_>) -> Result<T>,
    ) -> Result<T> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|err| FolioError::RenderError(format!("cannot open document: {}", err)))?;
        body(&document)
    }
}

/// A directory source resolves to the platform library name inside it.
fn library_location(source: &str) -> PathBuf {
    let path = Path::new(source);
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

fn page_at<'a>(document: &'a PdfDocument<'_>, page_number: u32) -> Result<PdfPage<'a>> {
    let total = document.pages().len() as u32;
    if page_number == 0 || page_number > total {
        return Err(FolioError::RenderError(format!(
            "page {} out of range (document has {} pages)",
            page_number, total
        )));
    }
    document
        .pages()
        .get((page_number - 1) as u16)
        .map_err(|err| FolioError::RenderError(format!("cannot load page {}: {}", page_number, err)))
}

impl RenderEngine for PdfiumRenderer {
    fn configure_worker(&self, source: &str) -> Result<()> {
        let location = library_location(source);
        match self.library.set(location) {
            Ok(()) => info!(source, "Rendering library configured"),
            Err(ignored) => warn!(
                ignored = %ignored.display(),
                "Rendering library already configured, keeping the first location"
            ),
        }
        Ok(())
    }

    #[instrument(skip_all, fields(bytes_len = pdf.len()))]
    fn page_count(&self, pdf: &[u8]) -> Result<u32> {
        self.with_document(pdf, |document| Ok(document.pages().len() as u32))
    }

    #[instrument(skip_all, fields(page_number))]
    fn page_text(&self, pdf: &[u8], page_number: u32) -> Result<Vec<String>> {
        self.with_document(pdf, |document| {
            let page = page_at(document, page_number)?;
            let text = page
                .text()
                .map_err(|err| FolioError::RenderError(format!("cannot read text of page {}: {}", page_number, err)))?;
            let items: Vec<String> = text
                .all()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            debug!(items = items.len(), "Page text extracted");
            Ok(items)
        })
    }

    #[instrument(skip_all, fields(page_number, scale))]
    fn render_page(&self, pdf: &[u8], page_number: u32, scale: f32) -> Result<RgbaImage> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(FolioError::InvalidOption {
                key: "scale".into(),
                reason: format!("{} is not a positive factor", scale),
            });
        }
        self.with_document(pdf, |document| {
            let page = page_at(document, page_number)?;
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let bitmap = page
                .render_with_config(&config)
                .map_err(|err| FolioError::RenderError(format!("cannot render page {}: {}", page_number, err)))?;
            let surface = bitmap.as_image().to_rgba8();
            debug!(width = surface.width(), height = surface.height(), "Page rendered");
            Ok(surface)
        })
    }

    /// Binds and opens the document once for the whole run.
    fn render_pages(
        &self,
        pdf: &[u8],
        scale: f32,
        each: &mut dyn FnMut(u32, RgbaImage) -> Result<()>,
    ) -> Result<()> {
        self.with_document(pdf, |document| {
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let total = document.pages().len() as u32;
            for page_number in 1..=total {
                let page = page_at(document, page_number)?;
                let bitmap = page.render_with_config(&config).map_err(|err| {
                    FolioError::RenderError(format!("cannot render page {}: {}", page_number, err))
                })?;
                each(page_number, bitmap.as_image().to_rgba8())?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_location_is_set_once() {
        let renderer = PdfiumRenderer::new();
        renderer.configure_worker("/opt/pdfium/libpdfium.so").unwrap();
        renderer.configure_worker("/elsewhere/libpdfium.so").unwrap();
        assert_eq!(renderer.library_path(), Some(Path::new("/opt/pdfium/libpdfium.so")));
    }

    #[test]
    fn directory_source_names_the_platform_library() {
        let dir = std::env::temp_dir();
        let location = library_location(dir.to_str().unwrap());
        assert_eq!(location.parent(), Some(dir.as_path()));
        assert!(location.file_name().unwrap().to_string_lossy().contains("pdfium"));
    }

    #[test]
    fn non_positive_scale_is_rejected_before_binding() {
        let result = PdfiumRenderer::new().render_page(b"%PDF-1.7", 1, 0.0);
        assert!(matches!(result, Err(FolioError::InvalidOption { .. })));
    }
}
