// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-pipeline: the tool-invocation pipeline.
//
// A `CapabilityRegistry` of engines is injected by the host; the
// `ReadinessGate` waits for the required ones; a `Workbench` session stages
// files for a tool from the `ToolRegistry`, derives the editor mode (with the
// page organizer or the annotation editor), runs the tool on a blocking
// thread and hands outputs to a `Materializer`.

pub mod accept;
pub mod annotate;
pub mod capability;
pub mod invoker;
pub mod materialize;
pub mod mode;
pub mod organize;
pub mod progress;
pub mod readiness;
pub mod signature;
pub mod staging;
pub mod tool;
pub mod tools;
pub mod workbench;

pub use accept::AcceptPattern;
pub use annotate::{Annotator, Shape};
pub use capability::{CapabilityRegistry, Engine};
pub use invoker::{PendingRun, RunCompletion, RunTicket};
#[cfg(feature = "dialog")]
pub use materialize::DialogMaterializer;
pub use materialize::{DirectoryMaterializer, Materializer};
pub use mode::{EDIT_TOOL, ORGANIZE_TOOL, editor_mode};
pub use organize::PageOrganizer;
pub use progress::{LogProgress, ProgressGuard, ProgressSink, WatchProgress};
pub use readiness::{Readiness, ReadinessGate, check_readiness};
pub use signature::SignaturePad;
pub use staging::StagingArea;
pub use tool::{
    FieldKind, OptionEditor, OptionField, OptionValue, ProcessFn, ProcessOutcome, SelectHook, ToolContext,
    ToolDescriptor, ToolRegistry,
};
pub use tools::pages::parse_page_range;
pub use workbench::{RunStatus, Workbench};
