// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document: engine contracts and their in-tree implementations.
//
// PDF editing (lopdf), text layout (printpdf), raster decoding and encoding
// (image), overlay flattening (imageproc), Office Open XML containers
// (zip + quick-xml), and optionally page rendering (pdfium) and text
// recognition (ocrs).

pub mod archive;
pub mod canvas;
pub mod image;
pub mod office;
pub mod pdf;
pub mod traits;

#[cfg(feature = "ocr")]
pub mod ocr;
#[cfg(feature = "pdfium")]
pub mod render;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use archive::ZipArchiver;
pub use canvas::{VectorCanvas, VectorCanvasEngine};
pub use image::{ImageProcessor, ImageRasterDecoder};
pub use office::{DocxReader, PptxWriter, XlsxReader};
pub use pdf::{LopdfEngine, PrintpdfLayout};
pub use traits::*;

#[cfg(feature = "ocr")]
pub use ocr::{ModelPaths, OcrsRecognizer};
#[cfg(feature = "pdfium")]
pub use render::PdfiumRenderer;
