// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing invoker: runs a prepared tool call off the async runtime.

use folio_core::error::{FolioError, Result};
use folio_core::{ProcessOptions, StagedFile};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::progress::ProgressGuard;
use crate::tool::{ProcessOutcome, ToolContext};

/// Identifies a run and the session generation it was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket {
    pub run_id: Uuid,
    pub generation: u64,
}

/// A validated tool call, ready to execute.
pub struct PendingRun {
    pub ticket: RunTicket,
    pub(crate) files: Vec<StagedFile>,
    pub(crate) options: ProcessOptions,
    pub(crate) context: ToolContext,
}

/// The result of a run, tagged with the ticket it was started under.
#[derive(Debug)]
pub struct RunCompletion {
    pub ticket: RunTicket,
    pub result: Result<ProcessOutcome>,
}

impl PendingRun {
    pub fn tool_id(&self) -> &'static str {
        self.context.tool.id
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Run the tool on a blocking thread. Progress is cleared exactly once,
    /// whether the tool succeeds, fails or panics.
    #[instrument(skip_all, fields(tool = self.context.tool.id, run_id = %self.ticket.run_id))]
    pub async fn execute(self) -> RunCompletion {
        let Self {
            ticket,
            files,
            options,
            context,
        } = self;

        let joined = tokio::task::spawn_blocking(move || {
            let _clear = ProgressGuard::new(context.progress());
            (context.tool.process)(&context, &files, &options)
        })
        .await;

        let result = match joined {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "Tool task did not complete");
                Err(FolioError::TaskFailed(err.to_string()))
            }
        };
        match &result {
            Ok(ProcessOutcome::Artifacts(artifacts)) => info!(artifacts = artifacts.len(), "Run finished"),
            Ok(ProcessOutcome::Materialized(paths)) => info!(saved = paths.len(), "Run finished"),
            Err(err) => warn!(error = %err, "Run failed"),
        }
        RunCompletion { ticket, result }
    }
}
