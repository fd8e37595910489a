// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Catalog entries without a conversion behind them yet.

use folio_core::error::{FolioError, Result};
use folio_core::{ProcessOptions, StagedFile};

use crate::tool::{ProcessOutcome, ToolContext};

pub fn not_implemented(ctx: &ToolContext, _files: &[StagedFile], _options: &ProcessOptions) -> Result<ProcessOutcome> {
    ctx.report("Processing...");
    Err(FolioError::NotImplemented(ctx.tool.title.to_string()))
}
