// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Capability;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE: &str = "folio.json";

/// Persistent pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capabilities that must be installed before any tool may run.
    pub required_capabilities: Vec<Capability>,
    /// Delay between readiness checks, in milliseconds.
    pub readiness_poll_interval_ms: u64,
    /// Number of readiness checks before giving up.
    pub readiness_max_attempts: u32,
    /// Location handed once to the rendering capability (e.g. the directory
    /// holding the Pdfium library).
    pub worker_source: Option<String>,
    /// Render scale for organize thumbnails.
    pub preview_scale: f32,
    /// Render scale for the annotation canvas background.
    pub edit_scale: f32,
    /// Render scale for page-to-image export.
    pub raster_scale: f32,
    /// Render scale for page-to-slide export.
    pub slide_scale: f32,
    /// Render scale for text recognition.
    pub recognition_scale: f32,
    /// JPEG quality (1-100) for page-to-image export.
    pub jpeg_quality: u8,
    /// Where artifacts are written when materialized.
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            required_capabilities: vec![Capability::DocumentModel],
            readiness_poll_interval_ms: 100,
            readiness_max_attempts: 50,
            worker_source: None,
            preview_scale: 0.5,
            edit_scale: 1.5,
            raster_scale: 2.0,
            slide_scale: 1.5,
            recognition_scale: 2.0,
            jpeg_quality: 90,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PipelineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_ms)
    }

    /// Load `folio.json` from `dir`. A missing file yields `None`; a present but
    /// malformed file is an error.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Load from `dir`, falling back to defaults when no file exists.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        Ok(Self::load(dir)?.unwrap_or_default())
    }

    pub fn persist(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}
