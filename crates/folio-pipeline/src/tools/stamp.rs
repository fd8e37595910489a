// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stamping tools: drawn signature and text watermark.

use folio_core::error::{FolioError, Result};
use folio_core::{Color, ProcessOptions, StagedFile};
use folio_document::traits::{Anchor, ImageStamp, TextStamp};

use super::{first, single_pdf};
use crate::tool::{ProcessOutcome, ToolContext};

const SIGNATURE_ORIGIN: (f32, f32) = (50.0, 50.0);
const SIGNATURE_SIZE: (f32, f32) = (150.0, 75.0);

const WATERMARK_FONT_SIZE: f32 = 50.0;
const WATERMARK_GRAY: Color = Color::rgb(128, 128, 128);
const WATERMARK_ROTATION: f32 = 45.0;

/// Place the signature on the first page.
pub fn sign(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let image = options
        .tool
        .signature()
        .image
        .ok_or_else(|| FolioError::precondition("Please draw a signature."))?;
    let engine = ctx.document_model()?;
    ctx.report("Adding signature...");

    let stamp = ImageStamp {
        image: image.to_vec(),
        page_index: 0,
        x: SIGNATURE_ORIGIN.0,
        y: SIGNATURE_ORIGIN.1,
        width: SIGNATURE_SIZE.0,
        height: SIGNATURE_SIZE.1,
    };
    Ok(single_pdf(engine.stamp_image(file.bytes(), &stamp)?, "signed.pdf"))
}

/// Diagonal gray text across the middle of every page.
pub fn watermark(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let settings = options.tool.watermark();
    let text = settings
        .text
        .filter(|text| !text.is_empty())
        .ok_or_else(|| FolioError::precondition("Please enter watermark text."))?;
    let engine = ctx.document_model()?;
    ctx.report("Adding watermark...");

    let stamp = TextStamp {
        text,
        font_size: WATERMARK_FONT_SIZE,
        color: WATERMARK_GRAY,
        opacity: settings.opacity,
        rotation_degrees: WATERMARK_ROTATION,
        anchor: Anchor::Centre { dx: -100.0, dy: 0.0 },
    };
    Ok(single_pdf(engine.stamp_text(file.bytes(), &stamp)?, "watermarked.pdf"))
}
