// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: the lopdf document model and printpdf text layout.

pub mod document;
pub mod layout;
pub(crate) mod pages;
mod paint;

pub use document::LopdfEngine;
pub use layout::PrintpdfLayout;
