// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio core: types, options, overlays and error definitions shared across all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod options;
pub mod overlay;
pub mod types;

pub use config::PipelineConfig;
pub use error::{ErrorKind, FolioError, Result};
pub use options::*;
pub use overlay::{AnnotationLayer, Color, OverlayObject, OverlaySnapshot, Point};
pub use types::*;
