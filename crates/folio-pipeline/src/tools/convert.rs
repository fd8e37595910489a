// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Conversion tools between PDF and text, slides, pictures and office files.

use folio_core::error::Result;
use folio_core::{OutputArtifact, ProcessOptions, StagedFile, media};
use folio_document::ImageProcessor;
use folio_document::traits::{ArchiveEntry, SlideImage};
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::{debug, info, instrument};

use super::{first, single_pdf};
use crate::tool::{ProcessOutcome, ToolContext};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Text items of each page joined by spaces, each page followed by a blank line.
#[instrument(skip_all)]
pub fn pdf_to_text(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let renderer = ctx.rendering()?;
    ctx.report("Converting PDF to Text...");

    let page_count = renderer.page_count(file.bytes())?;
    let mut text = String::new();
    for page_number in 1..=page_count {
        text.push_str(&renderer.page_text(file.bytes(), page_number)?.join(" "));
        text.push_str("\n\n");
    }
    debug!(page_count, chars = text.len(), "Text extracted");
    Ok(ProcessOutcome::Artifacts(vec![OutputArtifact::text(text, "converted.txt", media::TEXT)]))
}

/// One picture slide per page.
#[instrument(skip_all)]
pub fn pdf_to_slides(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let renderer = ctx.rendering()?;
    let presentation = ctx.presentation()?;
    ctx.report("Loading PDF...");

    let page_count = renderer.page_count(file.bytes())?;
    let mut slides = Vec::with_capacity(page_count as usize);
    for page_number in 1..=page_count {
        ctx.report(&format!("Processing page {page_number}/{page_count}..."));
        let surface = renderer.render_page(file.bytes(), page_number, ctx.config().slide_scale)?;
        let (width, height) = surface.dimensions();
        let png = ImageProcessor::from_rgba(surface).to_png_bytes()?;
        slides.push(SlideImage { png, width, height });
    }

    let pptx = presentation.image_slides(&slides)?;
    Ok(ProcessOutcome::Artifacts(vec![OutputArtifact::binary(pptx, "converted.pptx", media::PPTX)]))
}

fn page_jpeg(surface: RgbaImage, quality: u8) -> Result<Vec<u8>> {
    ImageProcessor::from_rgba(surface).flatten(WHITE).to_jpeg_bytes(quality)
}

/// A single page becomes `<name>.jpg`; more pages are zipped as `page_<n>.jpg`.
#[instrument(skip_all)]
pub fn pdf_to_jpg(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let renderer = ctx.rendering()?;
    ctx.report("Loading PDF...");

    let config = ctx.config();
    let page_count = renderer.page_count(file.bytes())?;
    if page_count == 1 {
        let surface = renderer.render_page(file.bytes(), 1, config.raster_scale)?;
        let jpeg = page_jpeg(surface, config.jpeg_quality)?;
        let filename = format!("{}.jpg", file.stem());
        return Ok(ProcessOutcome::Artifacts(vec![OutputArtifact::binary(jpeg, filename, media::JPEG)]));
    }

    let archive = ctx.archive()?;
    let mut entries = Vec::with_capacity(page_count as usize);
    for page_number in 1..=page_count {
        ctx.report(&format!("Converting page {page_number}/{page_count}"));
        let surface = renderer.render_page(file.bytes(), page_number, config.raster_scale)?;
        entries.push(ArchiveEntry {
            name: format!("page_{page_number}.jpg"),
            data: page_jpeg(surface, config.jpeg_quality)?,
        });
    }
    let zip = archive.pack(&entries)?;
    Ok(ProcessOutcome::Artifacts(vec![OutputArtifact::binary(zip, "images.zip", media::ZIP)]))
}

/// Lays the document out and saves it directly instead of returning it.
#[instrument(skip_all)]
pub fn word_to_pdf(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let reader = ctx.office_document()?;
    let layout = ctx.page_layout()?;
    ctx.report("Converting Word to PDF...");

    let paragraphs = reader.paragraphs(file.bytes())?;
    let pdf = layout.text_document(file.stem(), &paragraphs)?;
    let artifact = OutputArtifact::pdf(pdf, format!("{}.pdf", file.stem()));
    let path = ctx.materialize(&artifact)?;
    info!(path = %path.display(), "Converted document saved");
    Ok(ProcessOutcome::Materialized(vec![path]))
}

/// Every sheet in order: its name, then one line per non-empty row.
#[instrument(skip_all)]
pub fn excel_to_pdf(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let reader = ctx.spreadsheet()?;
    let layout = ctx.page_layout()?;
    ctx.report("Converting Excel to PDF...");

    let mut paragraphs = Vec::new();
    for sheet in reader.sheets(file.bytes())? {
        paragraphs.push(sheet.name);
        paragraphs.extend(
            sheet
                .rows
                .iter()
                .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
                .map(|row| row.join(" | ")),
        );
        paragraphs.push(String::new());
    }
    let pdf = layout.text_document(file.stem(), &paragraphs)?;
    Ok(single_pdf(pdf, &format!("{}.pdf", file.stem())))
}

/// One page per picture, in staged order.
#[instrument(skip_all, fields(files = files.len()))]
pub fn images_to_pdf(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Converting images to PDF...");

    let images = files
        .iter()
        .map(|file| ImageProcessor::from_bytes(file.bytes()).map(ImageProcessor::into_dynamic))
        .collect::<Result<Vec<DynamicImage>>>()?;
    Ok(single_pdf(engine.images_to_pdf(&images)?, "images.pdf"))
}

/// Like `images_to_pdf`, with every frame of multi-page files.
#[instrument(skip_all, fields(files = files.len()))]
pub fn tiff_to_pdf(ctx: &ToolContext, files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    first(files)?;
    let decoder = ctx.raster_decoder()?;
    let engine = ctx.document_model()?;
    ctx.report("Converting images to PDF...");

    let mut images = Vec::new();
    for file in files {
        images.extend(decoder.decode_frames(file.bytes())?);
    }
    debug!(frames = images.len(), "Frames decoded");
    Ok(single_pdf(engine.images_to_pdf(&images)?, "images.pdf"))
}
