// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File staging with all-or-nothing validation.

use folio_core::error::{FolioError, Result};
use folio_core::{StagedFile, ToolOptions};
use tracing::{debug, info, instrument};

use crate::tool::ToolDescriptor;

/// The ordered input files of the current session.
#[derive(Debug, Clone, Default)]
pub struct StagingArea {
    files: Vec<StagedFile>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `incoming` for `tool`.
    ///
    /// Single-file tools replace the staged set, multi-file tools append to
    /// it. Every file of the resulting set must match the tool's accept
    /// pattern, otherwise nothing changes. On success the tool's selection
    /// hook may seed `options`.
    #[instrument(skip_all, fields(tool = tool.id, incoming = incoming.len()))]
    pub fn stage(&mut self, tool: &ToolDescriptor, incoming: Vec<StagedFile>, options: &mut ToolOptions) -> Result<()> {
        let candidates: Vec<StagedFile> = if tool.multiple_files {
            self.files.iter().cloned().chain(incoming).collect()
        } else {
            incoming
        };

        let pattern = tool.accept_pattern();
        let rejected: Vec<String> = candidates
            .iter()
            .filter(|file| !pattern.matches(file))
            .map(|file| file.name().to_string())
            .collect();
        if !rejected.is_empty() {
            debug!(rejected = rejected.len(), accept = tool.accept, "Staging rejected");
            return Err(FolioError::Validation {
                accepted: tool.accept.to_string(),
                rejected,
            });
        }

        self.files = candidates;
        if let Some(hook) = tool.on_select {
            hook(&self.files, options);
        }
        info!(staged = self.files.len(), "Files staged");
        Ok(())
    }

    /// Remove one file. No validation; `None` when out of range.
    pub fn unstage(&mut self, index: usize) -> Option<StagedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
