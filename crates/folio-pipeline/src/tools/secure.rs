// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password tools. What the document model supports decides the outcome.

use folio_core::error::{FolioError, Result};
use folio_core::{ProcessOptions, StagedFile};

use super::{first, single_pdf};
use crate::tool::{ProcessOutcome, ToolContext};

pub fn unlock(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let engine = ctx.document_model()?;
    ctx.report("Unlocking PDF...");
    let password = options.tool.password().password.unwrap_or_default();
    Ok(single_pdf(engine.unlock(file.bytes(), &password)?, "unlocked.pdf"))
}

pub fn protect(ctx: &ToolContext, files: &[StagedFile], options: &ProcessOptions) -> Result<ProcessOutcome> {
    let file = first(files)?;
    let password = options
        .tool
        .password()
        .password
        .ok_or_else(|| FolioError::precondition("Please enter a password."))?;
    let engine = ctx.document_model()?;
    ctx.report("Protecting PDF...");
    Ok(single_pdf(engine.protect(file.bytes(), &password)?, "protected.pdf"))
}
