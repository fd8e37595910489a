// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool descriptors, the tool registry, and the context a tool runs with.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use folio_core::error::{FolioError, Result};
use folio_core::{OutputArtifact, PipelineConfig, ProcessOptions, StagedFile, ToolOptions};
use folio_document::traits::{
    ArchiveWriter, CanvasEngine, DocumentEngine, OfficeReader, PageLayout, PresentationWriter, RasterDecoder,
    RenderEngine, SpreadsheetReader, TextRecognizer,
};

use crate::accept::AcceptPattern;
use crate::capability::CapabilityRegistry;
use crate::materialize::Materializer;
use crate::progress::ProgressSink;

// -- Descriptors --------------------------------------------------------------

/// A tool's transformation. Runs on a blocking thread.
pub type ProcessFn = fn(&ToolContext, &[StagedFile], &ProcessOptions) -> Result<ProcessOutcome>;

/// Runs after a successful staging with the new staged set; may seed options.
pub type SelectHook = fn(&[StagedFile], &mut ToolOptions);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Choice(&'static [&'static str]),
    /// Raw bytes, e.g. a drawn signature.
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionField {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

/// A value written through a tool's option editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Text(String),
    Bytes(Arc<[u8]>),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }
}

/// The options form of a tool: its fields and how a write lands in the store.
#[derive(Debug)]
pub struct OptionEditor {
    pub fields: &'static [OptionField],
    pub apply: fn(&mut ToolOptions, &str, OptionValue) -> Result<()>,
}

impl OptionEditor {
    pub fn field(&self, key: &str) -> Option<&OptionField> {
        self.fields.iter().find(|field| field.key == key)
    }
}

/// Static description of one tool.
#[derive(Debug, Clone, Copy)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub accept: &'static str,
    pub multiple_files: bool,
    pub is_new: bool,
    pub options: Option<&'static OptionEditor>,
    pub on_select: Option<SelectHook>,
    pub process: ProcessFn,
}

impl ToolDescriptor {
    pub fn accept_pattern(&self) -> AcceptPattern<'static> {
        AcceptPattern::new(self.accept)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Artifacts for the host to keep and materialize.
    Artifacts(Vec<OutputArtifact>),
    /// The tool saved its output itself.
    Materialized(Vec<PathBuf>),
}

// -- Registry -----------------------------------------------------------------

/// The available tools, in catalog order.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.id) {
                return Err(FolioError::precondition(format!("duplicate tool id: {}", tool.id)));
            }
        }
        Ok(Self { tools })
    }

    /// The built-in catalog.
    pub fn builtin() -> Self {
        Self {
            tools: crate::tools::catalog(),
        }
    }

    pub fn get(&self, id: &str) -> Result<&ToolDescriptor> {
        self.tools
            .iter()
            .find(|tool| tool.id == id)
            .ok_or_else(|| FolioError::UnknownTool(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

// -- Context ------------------------------------------------------------------

/// Everything a tool's process function may reach.
///
/// Capabilities are looked up on every call, so an engine removed after
/// readiness surfaces as `MissingCapability` at the point of use.
#[derive(Clone)]
pub struct ToolContext {
    pub tool: ToolDescriptor,
    registry: CapabilityRegistry,
    progress: Arc<dyn ProgressSink>,
    materializer: Arc<dyn Materializer>,
    config: Arc<PipelineConfig>,
}

impl ToolContext {
    pub fn new(
        tool: ToolDescriptor,
        registry: CapabilityRegistry,
        progress: Arc<dyn ProgressSink>,
        materializer: Arc<dyn Materializer>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            tool,
            registry,
            progress,
            materializer,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }

    pub fn report(&self, message: &str) {
        self.progress.report(message);
    }

    /// Save an artifact through the host's materializer.
    pub fn materialize(&self, artifact: &OutputArtifact) -> Result<PathBuf> {
        self.materializer.materialize(artifact)
    }

    pub fn document_model(&self) -> Result<Arc<dyn DocumentEngine>> {
        self.registry.document_model()
    }

    pub fn rendering(&self) -> Result<Arc<dyn RenderEngine>> {
        self.registry.rendering()
    }

    pub fn text_recognition(&self) -> Result<Arc<dyn TextRecognizer>> {
        self.registry.text_recognition()
    }

    pub fn page_layout(&self) -> Result<Arc<dyn PageLayout>> {
        self.registry.page_layout()
    }

    pub fn office_document(&self) -> Result<Arc<dyn OfficeReader>> {
        self.registry.office_document()
    }

    pub fn spreadsheet(&self) -> Result<Arc<dyn SpreadsheetReader>> {
        self.registry.spreadsheet()
    }

    pub fn presentation(&self) -> Result<Arc<dyn PresentationWriter>> {
        self.registry.presentation()
    }

    pub fn annotation_canvas(&self) -> Result<Arc<dyn CanvasEngine>> {
        self.registry.annotation_canvas()
    }

    pub fn archive(&self) -> Result<Arc<dyn ArchiveWriter>> {
        self.registry.archive()
    }

    pub fn raster_decoder(&self) -> Result<Arc<dyn RasterDecoder>> {
        self.registry.raster_decoder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &ToolContext, _: &[StagedFile], _: &ProcessOptions) -> Result<ProcessOutcome> {
        Ok(ProcessOutcome::Artifacts(Vec::new()))
    }

    fn descriptor(id: &'static str) -> ToolDescriptor {
        ToolDescriptor {
            id,
            title: "Test",
            description: "",
            accept: "application/pdf",
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: noop,
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = ToolRegistry::new(vec![descriptor("a"), descriptor("b"), descriptor("a")]).unwrap_err();
        assert!(err.to_string().contains("duplicate tool id: a"));
    }

    #[test]
    fn unknown_tool_lookup_fails() {
        let registry = ToolRegistry::new(vec![descriptor("a")]).unwrap();
        assert_eq!(registry.get("a").unwrap().id, "a");
        assert!(matches!(registry.get("zzz"), Err(FolioError::UnknownTool(_))));
    }

    #[test]
    fn builtin_catalog_has_unique_ids() {
        let builtin = ToolRegistry::builtin();
        let ids: Vec<&str> = builtin.iter().map(|tool| tool.id).collect();
        assert!(ToolRegistry::new(builtin.iter().copied().collect()).is_ok());
        assert_eq!(ids.first(), Some(&"merge-pdf"));
        assert_eq!(ids.last(), Some(&"excel-to-pdf-2"));
    }
}
