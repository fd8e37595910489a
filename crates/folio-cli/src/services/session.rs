// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session bootstrap: configuration, engines, readiness gate and workbench.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_core::PipelineConfig;
use folio_core::error::Result;
use folio_pipeline::{CapabilityRegistry, ReadinessGate, ToolRegistry, Workbench};
use tokio::task::JoinHandle;
use tracing::info;

/// What the command line can override on top of `folio.json`.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub save_dialog: bool,
}

/// A ready-to-use workbench with its readiness gate polling in the background.
pub struct Session {
    pub workbench: Workbench,
    gate: JoinHandle<()>,
}

impl Session {
    /// Load the configuration from `config_dir`, register the built-in
    /// engines and start the readiness gate. Call from inside a runtime.
    pub fn open(config_dir: &Path, overrides: Overrides) -> Result<Self> {
        let mut config = PipelineConfig::load_or_default(config_dir)?;
        if let Some(dir) = overrides.output_dir {
            config.output_dir = dir;
        }
        info!(
            config_dir = %config_dir.display(),
            output_dir = %config.output_dir.display(),
            "Opening session"
        );

        let registry = CapabilityRegistry::with_builtin_engines();
        let gate = ReadinessGate::new(registry.clone(), &config);
        let readiness = gate.subscribe();
        let gate = tokio::spawn(async move {
            gate.run().await;
        });

        let workbench = Workbench::new(ToolRegistry::builtin(), registry, readiness, Arc::new(config));
        let workbench = with_save_target(workbench, overrides.save_dialog);
        Ok(Self { workbench, gate })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.gate.abort();
    }
}

#[cfg(feature = "dialog")]
fn with_save_target(workbench: Workbench, save_dialog: bool) -> Workbench {
    if save_dialog {
        workbench.with_materializer(Arc::new(folio_pipeline::DialogMaterializer))
    } else {
        workbench
    }
}

#[cfg(not(feature = "dialog"))]
fn with_save_target(workbench: Workbench, save_dialog: bool) -> Workbench {
    if save_dialog {
        tracing::warn!("Built without the dialog feature; saving into the output directory");
    }
    workbench
}
