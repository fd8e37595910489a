// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-level PDF tools: merge, split, compress, rotate, organize, repair,
// edit, and page numbering.

use folio_core::error::{FolioError, Result};
use folio_core::{ProcessOptions, StagedFile};
use folio_document::traits::PageNumberStyle;
use tracing::{debug, instrument};

use super::{first, single_pdf};
use crate::tool::{ProcessOutcome, ToolContext};

/// Parse a 1-based range expression such as `"1-3, 5, 8-10"` into
/// zero-based indices.
///
/// Duplicates keep their first position and pages past the end are dropped.
/// A blank expression selects every page. Malformed parts, or an expression
/// that selects nothing, are errors.
pub fn parse_page_range(range: &str, page_count: usize) -> Result<Vec<usize>> {
    if range.trim().is_empty() {
        return Ok((0..page_count).collect());
    }

    let malformed = || FolioError::precondition(format!("\"{}\" is not a valid page range.", range.trim()));
    let number = |text: &str| text.trim().parse::<usize>().map_err(|_| malformed());

    let mut indices = Vec::new();
    let mut push = |page: usize| {
        if (1..=page_count).contains(&page) && !indices.contains(&(page - 1)) {
            indices.push(page - 1);
        }
    };
    for part in range.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (number(start)?, number(end)?);
                for page in start..=end.min(page_count) {
                    push(page);
                }
            }
            None => push(number(part)?),
        }
    }

    if indices.is_empty() {
        return Err(FolioError::precondition("None of the selected pages exist in this document."));
    }
    Ok(indices)
}

#[instrument(skip_all, fields(files = files.len()))]
pub fn merge(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Merging PDFs...");
    let documents: Vec<&[u8]> = files.iter().map(StagedFile::bytes).collect();
    Ok(single_pdf(engine.merge(&documents)?, "merged.pdf"))
}

#[instrument(skip_all)]
pub fn split(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Splitting PDF...");
    let page_count = engine.page_count(file.bytes())? as usize;
    let range = options.tool.page_range().range.unwrap_or_default();
    let indices = parse_page_range(&range, page_count)?;
    debug!(selected = indices.len(), page_count, "Range parsed");
    Ok(single_pdf(engine.select_pages(file.bytes(), &indices)?, "split.pdf"))
}

pub fn compress(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Compressing PDF...");
    Ok(single_pdf(engine.compress(file.bytes())?, "compressed.pdf"))
}

pub fn rotate(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Rotating PDF...");
    let angle = options.tool.rotation().angle;
    Ok(single_pdf(engine.rotate_pages(file.bytes(), angle)?, "rotated.pdf"))
}

/// Keep the pages in the organizer's order.
pub fn organize(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let order = match options.page_order.as_deref() {
        None => return Err(FolioError::precondition("Please open the document in the organizer first.")),
        Some([]) => return Err(FolioError::precondition("Please keep at least one page.")),
        Some(order) => order,
    };
    let engine = ctx.document_model()?;
    ctx.report("Saving page order...");
    Ok(single_pdf(engine.select_pages(file.bytes(), order)?, "organized.pdf"))
}

pub fn repair(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Repairing PDF...");
    Ok(single_pdf(engine.repair(file.bytes())?, "repaired.pdf"))
}

/// Merge the annotation layer into the document. Pages never annotated are
/// copied unchanged.
#[instrument(skip_all)]
pub fn edit(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Applying edits...");
    let layer = options.annotations.clone().unwrap_or_default();
    debug!(pages = layer.len(), "Applying overlays");
    Ok(single_pdf(engine.apply_overlays(file.bytes(), &layer)?, "edited.pdf"))
}

pub fn number(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Adding page numbers...");
    let settings = options.tool.page_numbers();
    let style = PageNumberStyle {
        start: settings.start,
        position: settings.position,
    };
    Ok(single_pdf(engine.number_pages(file.bytes(), &style)?, "numbered.pdf"))
}
