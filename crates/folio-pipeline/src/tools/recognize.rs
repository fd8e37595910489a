// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR tool: render, recognize, and add an invisible text layer.

use folio_core::error::Result;
use folio_core::{ProcessOptions, StagedFile};
use folio_document::traits::RecognizedPage;
use image::DynamicImage;
use tracing::{debug, instrument};

use super::{first, single_pdf};
use crate::tool::{ProcessOutcome, ToolContext};

/// Pages are rendered and recognized one at a time.
#[instrument(skip_all)]
pub fn searchable_pdf(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let renderer = ctx.rendering()?;
    let recognizer = ctx.text_recognition()?;
    let engine = ctx.document_model()?;
    ctx.report("Loading PDF...");

    let min_confidence = options.tool.recognition().min_confidence;
    let page_count = renderer.page_count(file.bytes())?;
    let mut pages = Vec::with_capacity(page_count as usize);
    for page_number in 1..=page_count {
        ctx.report(&format!("Recognizing page {page_number}/{page_count}"));
        let surface = renderer.render_page(file.bytes(), page_number, ctx.config().recognition_scale)?;
        let (image_width, image_height) = surface.dimensions();
        let mut words = recognizer.recognize(&DynamicImage::ImageRgba8(surface))?;
        // Words without a reported confidence are kept.
        words.retain(|word| word.confidence.is_none_or(|confidence| confidence >= min_confidence));
        debug!(page_number, words = words.len(), "Page recognized");
        pages.push(RecognizedPage {
            page_index: (page_number - 1) as usize,
            image_width,
            image_height,
            words,
        });
    }

    Ok(single_pdf(engine.add_text_layer(file.bytes(), &pages)?, "searchable.pdf"))
}
