// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor mode reducer.

use folio_core::EditorMode;

/// Tool whose single staged document opens the page organizer.
pub const ORGANIZE_TOOL: &str = "organize-pdf";
/// Tool whose single staged document opens the annotation editor.
pub const EDIT_TOOL: &str = "edit-pdf";

/// The mode a session should be in. Pure; re-evaluated on every event.
pub fn editor_mode(tool_id: Option<&str>, staged_count: usize) -> EditorMode {
    match (tool_id, staged_count) {
        (Some(ORGANIZE_TOOL), 1) => EditorMode::Organize,
        (Some(EDIT_TOOL), 1) => EditorMode::Edit,
        _ => EditorMode::Default,
    }
}
