// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Workbench: one editing session.
//
// Owns the active tool, the staged files, the option store, the derived
// editor mode with its sub-editor, and the outputs of the last run. All
// mutation goes through `&mut self`; only the tool body runs elsewhere (on a
// blocking thread, see `invoker`).
//
// Every reset or tool change bumps the session generation. A run started in
// an older generation goes quiet and is dropped when it completes.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use folio_core::error::{FolioError, Result};
use folio_core::{AnnotationLayer, EditorMode, OutputArtifact, PipelineConfig, ProcessOptions, StagedFile, ToolOptions};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::annotate::Annotator;
use crate::capability::CapabilityRegistry;
use crate::invoker::{PendingRun, RunCompletion, RunTicket};
use crate::materialize::{DirectoryMaterializer, Materializer};
use crate::mode::editor_mode;
use crate::organize::PageOrganizer;
use crate::progress::{GenerationProgress, LogProgress, ProgressSink};
use crate::readiness::Readiness;
use crate::staging::StagingArea;
use crate::tool::{OptionValue, ProcessOutcome, ToolContext, ToolDescriptor, ToolRegistry};

/// How a completed run was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// This many artifacts are now in `outputs()`.
    Produced(usize),
    /// The tool saved its output itself.
    Saved(Vec<PathBuf>),
    /// The run belonged to an earlier session state; nothing changed.
    Discarded,
}

pub struct Workbench {
    tools: ToolRegistry,
    registry: CapabilityRegistry,
    readiness: watch::Receiver<Readiness>,
    config: Arc<PipelineConfig>,
    progress: Arc<dyn ProgressSink>,
    materializer: Arc<dyn Materializer>,

    active: Option<ToolDescriptor>,
    staging: StagingArea,
    options: ToolOptions,

    mode: EditorMode,
    /// Fingerprint of the document the current sub-editor was set up for.
    mode_document: Option<String>,
    organizer: Option<PageOrganizer>,
    annotator: Option<Annotator>,
    /// Saved overlays of the last edited document, kept after leaving edit mode.
    annotations: Option<(String, AnnotationLayer)>,

    outputs: Vec<OutputArtifact>,
    /// Shared with running tools so an outdated run stops reporting.
    generation: Arc<AtomicU64>,
    in_flight: Option<Uuid>,
}

impl Workbench {
    /// A session that logs progress and saves into `config.output_dir`.
    pub fn new(
        tools: ToolRegistry,
        registry: CapabilityRegistry,
        readiness: watch::Receiver<Readiness>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        let materializer = Arc::new(DirectoryMaterializer::new(config.output_dir.clone()));
        Self {
            tools,
            registry,
            readiness,
            config,
            progress: Arc::new(LogProgress),
            materializer,
            active: None,
            staging: StagingArea::new(),
            options: ToolOptions::Empty,
            mode: EditorMode::Default,
            mode_document: None,
            organizer: None,
            annotator: None,
            annotations: None,
            outputs: Vec::new(),
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_materializer(mut self, materializer: Arc<dyn Materializer>) -> Self {
        self.materializer = materializer;
        self
    }

    // -- Readiness ------------------------------------------------------------

    pub fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }

    /// Wait for the readiness gate to settle; `Ok` only when ready.
    pub async fn wait_until_ready(&mut self) -> Result<()> {
        let settled = self
            .readiness
            .wait_for(Readiness::is_terminal)
            .await
            .map(|state| state.clone());
        // A dropped gate leaves whatever it last published.
        let state = settled.unwrap_or_else(|_| self.readiness.borrow().clone());
        state.ensure_ready()
    }

    // -- Session --------------------------------------------------------------

    /// Switch tools. Everything tied to the previous tool is dropped.
    #[instrument(skip(self))]
    pub fn select_tool(&mut self, id: &str) -> Result<()> {
        let tool = *self.tools.get(id)?;
        self.reset();
        self.active = Some(tool);
        info!(tool = tool.id, "Tool selected");
        Ok(())
    }

    /// Back to the tool's initial state: no files, default options, no
    /// outputs, no annotations. Any run in flight becomes stale.
    pub fn reset(&mut self) {
        self.staging.clear();
        self.options = ToolOptions::Empty;
        self.mode = EditorMode::Default;
        self.mode_document = None;
        self.organizer = None;
        self.annotator = None;
        self.annotations = None;
        self.outputs.clear();
        self.in_flight = None;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.progress.clear();
        debug!(generation, "Session reset");
    }

    pub fn stage(&mut self, files: Vec<StagedFile>) -> Result<()> {
        let tool = self.active_or_err()?;
        self.staging.stage(&tool, files, &mut self.options)?;
        self.refresh_mode()
    }

    /// Remove one staged file; `Ok(None)` when out of range.
    pub fn unstage(&mut self, index: usize) -> Result<Option<StagedFile>> {
        let removed = self.staging.unstage(index);
        if removed.is_some() {
            self.refresh_mode()?;
        }
        Ok(removed)
    }

    /// Write one option through the active tool's option editor.
    pub fn set_option(&mut self, key: &str, value: OptionValue) -> Result<()> {
        let tool = self.active_or_err()?;
        let editor = tool.options.ok_or_else(|| FolioError::InvalidOption {
            key: key.to_string(),
            reason: format!("{} has no options", tool.title),
        })?;
        if editor.field(key).is_none() {
            return Err(FolioError::InvalidOption {
                key: key.to_string(),
                reason: format!("{} has no such option", tool.title),
            });
        }
        (editor.apply)(&mut self.options, key, value)
    }

    // -- Editor mode ----------------------------------------------------------

    /// Re-derive the editor mode and set up or tear down sub-editors.
    ///
    /// When setup fails the session stays in the default mode with its files
    /// staged, progress is cleared and the error is returned.
    fn refresh_mode(&mut self) -> Result<()> {
        let target = editor_mode(self.active.map(|tool| tool.id), self.staging.len());
        let document = match target {
            EditorMode::Default => None,
            _ => self.staging.files().first().map(|file| file.fingerprint().to_string()),
        };
        if target == self.mode && document == self.mode_document {
            return Ok(());
        }

        self.leave_mode();
        let entered = match target {
            EditorMode::Default => return Ok(()),
            EditorMode::Organize => self.enter_organize(),
            EditorMode::Edit => self.enter_edit(),
        };
        self.progress.clear();

        match entered {
            Ok(()) => {
                self.mode = target;
                self.mode_document = document;
                info!(mode = %target, "Editor mode changed");
                Ok(())
            }
            Err(err) => {
                warn!(mode = %target, error = %err, "Editor setup failed");
                self.organizer = None;
                self.annotator = None;
                Err(err)
            }
        }
    }

    /// Keeps the saved layer of the edited document. Unsaved edits on the
    /// open page are dropped; pages are only saved when navigation leaves
    /// them or a run begins.
    fn leave_mode(&mut self) {
        if let Some(annotator) = self.annotator.take() {
            let fingerprint = annotator.fingerprint().to_string();
            self.annotations = Some((fingerprint, annotator.into_layer()));
        }
        self.organizer = None;
        self.mode = EditorMode::Default;
        self.mode_document = None;
    }

    fn enter_organize(&mut self) -> Result<()> {
        let file = self.single_document()?;
        self.progress.report("Loading pages...");
        let renderer = self.registry.rendering()?;
        let organizer = PageOrganizer::from_document(renderer.as_ref(), file.bytes(), self.config.preview_scale)?;
        self.organizer = Some(organizer);
        Ok(())
    }

    fn enter_edit(&mut self) -> Result<()> {
        let file = self.single_document()?;
        self.progress.report("Loading editor...");
        let renderer = self.registry.rendering()?;
        let canvas_engine = self.registry.annotation_canvas()?;

        // Overlays only carry over to the document they were drawn on.
        let layer = match &self.annotations {
            Some((fingerprint, layer)) if fingerprint == file.fingerprint() => layer.clone(),
            _ => AnnotationLayer::new(),
        };
        let annotator = Annotator::open(
            renderer,
            canvas_engine.as_ref(),
            file.bytes().into(),
            file.fingerprint().to_string(),
            self.config.edit_scale,
            layer,
        )?;
        self.annotations = None;
        self.annotator = Some(annotator);
        Ok(())
    }

    fn single_document(&self) -> Result<StagedFile> {
        self.staging
            .files()
            .first()
            .cloned()
            .ok_or(FolioError::NoFilesStaged)
    }

    pub fn organizer_mut(&mut self) -> Result<&mut PageOrganizer> {
        self.organizer
            .as_mut()
            .ok_or_else(|| FolioError::WrongMode(EditorMode::Organize.to_string()))
    }

    pub fn annotator_mut(&mut self) -> Result<&mut Annotator> {
        self.annotator
            .as_mut()
            .ok_or_else(|| FolioError::WrongMode(EditorMode::Edit.to_string()))
    }

    // -- Runs -----------------------------------------------------------------

    /// Validate and prepare a run of the active tool.
    ///
    /// Clears the previous outputs and injects the organize order or the
    /// annotation layer. Nothing is reported and no tool is called when a
    /// check fails.
    #[instrument(skip_all, fields(generation = self.generation()))]
    pub fn begin_run(&mut self) -> Result<PendingRun> {
        self.readiness.borrow().ensure_ready()?;
        if self.in_flight.is_some() {
            return Err(FolioError::RunInFlight);
        }
        let tool = self.active_or_err()?;
        if self.staging.is_empty() {
            return Err(FolioError::NoFilesStaged);
        }

        self.outputs.clear();
        let mut options = ProcessOptions::new(self.options.clone());
        match self.mode {
            EditorMode::Organize => {
                options.page_order = self.organizer.as_ref().map(PageOrganizer::page_order);
            }
            EditorMode::Edit => {
                if let Some(annotator) = self.annotator.as_mut() {
                    annotator.save_current_page_edits();
                    options.annotations = Some(annotator.layer().clone());
                }
            }
            EditorMode::Default => {}
        }

        let ticket = RunTicket {
            run_id: Uuid::new_v4(),
            generation: self.generation(),
        };
        self.in_flight = Some(ticket.run_id);
        info!(tool = tool.id, run_id = %ticket.run_id, files = self.staging.len(), "Run started");

        Ok(PendingRun {
            ticket,
            files: self.staging.files().to_vec(),
            options,
            context: ToolContext::new(
                tool,
                self.registry.clone(),
                Arc::new(GenerationProgress::new(self.progress.clone(), self.generation.clone())),
                self.materializer.clone(),
                self.config.clone(),
            ),
        })
    }

    /// Apply a completed run, unless it is stale. Errors leave the staged
    /// files and options as they were.
    pub fn finish_run(&mut self, completion: RunCompletion) -> Result<RunStatus> {
        let RunCompletion { ticket, result } = completion;
        if !self.is_current(ticket) {
            debug!(run_id = %ticket.run_id, "Stale run discarded");
            return Ok(RunStatus::Discarded);
        }
        self.in_flight = None;

        match result? {
            ProcessOutcome::Artifacts(artifacts) => {
                let produced = artifacts.len();
                self.outputs = artifacts;
                Ok(RunStatus::Produced(produced))
            }
            ProcessOutcome::Materialized(paths) => Ok(RunStatus::Saved(paths)),
        }
    }

    /// Give up on a run that will never be finished, e.g. a dropped
    /// `PendingRun`. Returns whether the ticket was the run in flight.
    pub fn cancel_run(&mut self, ticket: RunTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.in_flight = None;
        info!(run_id = %ticket.run_id, "Run cancelled");
        true
    }

    /// Begin, execute and finish a run. Dropping the returned future before
    /// it completes cancels the run.
    pub async fn run(&mut self) -> Result<RunStatus> {
        let pending = self.begin_run()?;
        let mut guard = InFlight {
            ticket: Some(pending.ticket),
            workbench: self,
        };
        let completion = pending.execute().await;
        guard.ticket = None;
        guard.workbench.finish_run(completion)
    }

    fn is_current(&self, ticket: RunTicket) -> bool {
        ticket.generation == self.generation() && self.in_flight == Some(ticket.run_id)
    }

    // -- Outputs --------------------------------------------------------------

    pub fn materialize(&self, index: usize) -> Result<PathBuf> {
        let artifact = self
            .outputs
            .get(index)
            .ok_or_else(|| FolioError::precondition(format!("There is no output number {}.", index + 1)))?;
        self.materializer.materialize(artifact)
    }

    pub fn materialize_all(&self) -> Result<Vec<PathBuf>> {
        self.outputs
            .iter()
            .map(|artifact| self.materializer.materialize(artifact))
            .collect()
    }

    // -- Accessors ------------------------------------------------------------

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn active_tool(&self) -> Option<&ToolDescriptor> {
        self.active.as_ref()
    }

    pub fn files(&self) -> &[StagedFile] {
        self.staging.files()
    }

    pub fn options(&self) -> &ToolOptions {
        &self.options
    }

    /// Direct access to the option store, e.g. for the signature pad.
    pub fn options_mut(&mut self) -> &mut ToolOptions {
        &mut self.options
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn organizer(&self) -> Option<&PageOrganizer> {
        self.organizer.as_ref()
    }

    pub fn annotator(&self) -> Option<&Annotator> {
        self.annotator.as_ref()
    }

    /// Saved overlays, live or kept from an earlier edit session.
    pub fn annotations(&self) -> Option<&AnnotationLayer> {
        match &self.annotator {
            Some(annotator) => Some(annotator.layer()),
            None => self.annotations.as_ref().map(|(_, layer)| layer),
        }
    }

    pub fn outputs(&self) -> &[OutputArtifact] {
        &self.outputs
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.is_some()
    }

    fn active_or_err(&self) -> Result<ToolDescriptor> {
        self.active
            .ok_or_else(|| FolioError::precondition("Please choose a tool first."))
    }
}

/// Cancels the run it holds when dropped.
struct InFlight<'a> {
    ticket: Option<RunTicket>,
    workbench: &'a mut Workbench,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            self.workbench.cancel_run(ticket);
        }
    }
}

impl std::fmt::Debug for Workbench {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbench")
            .field("tool", &self.active.map(|tool| tool.id))
            .field("staged", &self.staging.len())
            .field("mode", &self.mode)
            .field("outputs", &self.outputs.len())
            .field("generation", &self.generation())
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use folio_core::{OverlayObject, media};
    use folio_document::test_utils::{FixtureRenderer, page_operators, sample_pdf, sample_png};

    use crate::capability::Engine;

    /// Remembers everything reported to it.
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressSink for Recorder {
        fn report(&self, message: &str) {
            self.events.lock().unwrap().push(message.to_string());
        }

        fn clear(&self) {
            self.events.lock().unwrap().push("<clear>".into());
        }
    }

    struct FailingRenderer;

    impl folio_document::traits::RenderEngine for FailingRenderer {
        fn page_count(&self, _pdf: &[u8]) -> Result<u32> {
            Ok(3)
        }

        fn page_text(&self, _pdf: &[u8], _page_number: u32) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn render_page(&self, _pdf: &[u8], page_number: u32, _scale: f32) -> Result<image::RgbaImage> {
            Err(FolioError::RenderError(format!("page {page_number} is corrupt")))
        }
    }

    fn bench(readiness: Readiness, with_renderer: bool) -> (Workbench, Arc<Recorder>) {
        let registry = CapabilityRegistry::with_builtin_engines();
        if with_renderer {
            registry.install(Engine::Rendering(Arc::new(FixtureRenderer)));
        }
        let (_tx, rx) = watch::channel(readiness);
        let recorder = Arc::new(Recorder::default());
        let workbench = Workbench::new(
            ToolRegistry::builtin(),
            registry,
            rx,
            Arc::new(PipelineConfig::default()),
        )
        .with_progress(recorder.clone());
        (workbench, recorder)
    }

    fn pdf(name: &str, pages: u32) -> StagedFile {
        StagedFile::new(name, media::PDF, sample_pdf(pages))
    }

    #[test]
    fn runs_wait_for_readiness() {
        let (mut workbench, _) = bench(Readiness::Pending, true);
        workbench.select_tool("merge-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
        assert!(matches!(workbench.begin_run(), Err(FolioError::ReadinessPending)));
        assert!(!workbench.is_running());
    }

    #[test]
    fn empty_staging_reports_nothing() {
        let (mut workbench, recorder) = bench(Readiness::Ready, true);
        workbench.select_tool("compress-pdf").unwrap();
        let before = recorder.events();
        assert!(matches!(workbench.begin_run(), Err(FolioError::NoFilesStaged)));
        assert_eq!(recorder.events(), before);
    }

    #[test]
    fn second_run_is_refused_while_one_is_in_flight() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("compress-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();
        let _pending = workbench.begin_run().unwrap();
        assert!(matches!(workbench.begin_run(), Err(FolioError::RunInFlight)));
    }

    #[tokio::test]
    async fn stale_runs_are_discarded_after_reset() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("compress-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();
        let pending = workbench.begin_run().unwrap();

        workbench.reset();
        let completion = pending.execute().await;
        assert!(completion.result.is_ok());
        assert_eq!(workbench.finish_run(completion).unwrap(), RunStatus::Discarded);
        assert!(workbench.outputs().is_empty());
        assert!(!workbench.is_running());
    }

    #[tokio::test]
    async fn stale_run_leaves_the_next_tool_alone() {
        let (mut workbench, recorder) = bench(Readiness::Ready, true);
        workbench.select_tool("compress-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();
        let pending = workbench.begin_run().unwrap();

        workbench.select_tool("rotate-pdf").unwrap();
        workbench.stage(vec![pdf("b.pdf", 1)]).unwrap();
        let before = recorder.events();

        let completion = pending.execute().await;
        assert!(completion.result.is_ok());
        assert_eq!(workbench.finish_run(completion).unwrap(), RunStatus::Discarded);
        assert!(workbench.outputs().is_empty());
        assert_eq!(workbench.files().len(), 1);
        assert_eq!(workbench.files()[0].name(), "b.pdf");
        assert_eq!(recorder.events(), before);

        assert_eq!(workbench.run().await.unwrap(), RunStatus::Produced(1));
        assert_eq!(workbench.outputs()[0].filename, "rotated.pdf");
    }

    #[test]
    fn cancelled_ticket_frees_the_workbench() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("compress-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();
        let ticket = workbench.begin_run().unwrap().ticket;
        assert!(matches!(workbench.begin_run(), Err(FolioError::RunInFlight)));

        assert!(workbench.cancel_run(ticket));
        assert!(!workbench.is_running());
        assert!(!workbench.cancel_run(ticket));
        assert!(workbench.begin_run().is_ok());
    }

    static RELEASE: AtomicBool = AtomicBool::new(false);

    fn hold_until_released(
        _ctx: &ToolContext,
        files: &[StagedFile],
        _options: &ProcessOptions,
    ) -> Result<ProcessOutcome> {
        while !RELEASE.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(ProcessOutcome::Artifacts(vec![OutputArtifact::pdf(
            files[0].bytes().to_vec(),
            "held.pdf",
        )]))
    }

    #[tokio::test]
    async fn dropped_run_is_cancelled() {
        let tools = ToolRegistry::new(vec![ToolDescriptor {
            id: "hold",
            title: "Hold",
            description: "Waits to be released.",
            accept: media::PDF,
            multiple_files: false,
            is_new: false,
            options: None,
            on_select: None,
            process: hold_until_released,
        }])
        .unwrap();
        let (_tx, rx) = watch::channel(Readiness::Ready);
        let mut workbench = Workbench::new(
            tools,
            CapabilityRegistry::with_builtin_engines(),
            rx,
            Arc::new(PipelineConfig::default()),
        );
        workbench.select_tool("hold").unwrap();
        workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();

        tokio::select! {
            biased;
            _ = workbench.run() => panic!("the held run finished"),
            _ = tokio::time::sleep(Duration::from_millis(20)) => {}
        }
        RELEASE.store(true, Ordering::SeqCst);

        assert!(!workbench.is_running());
        assert!(workbench.outputs().is_empty());
        assert!(workbench.begin_run().is_ok());
    }

    #[tokio::test]
    async fn sign_needs_a_signature() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("sign-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();

        let err = workbench.run().await.unwrap_err();
        assert_eq!(err.to_string(), "Please draw a signature.");
        assert_eq!(workbench.files().len(), 1);
        assert!(workbench.outputs().is_empty());

        let png = sample_png(40, 20, [0, 0, 0, 255]);
        workbench.set_option("signature", OptionValue::Bytes(png.into())).unwrap();
        assert_eq!(workbench.run().await.unwrap(), RunStatus::Produced(1));
        let output = &workbench.outputs()[0];
        assert_eq!(output.filename, "signed.pdf");
        let signed = output.payload.as_bytes();
        assert!(page_operators(signed, 1).iter().any(|op| op == "Do"));
        assert!(!page_operators(signed, 2).iter().any(|op| op == "Do"));
    }

    #[tokio::test]
    async fn blank_watermark_text_is_stamped() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("watermark-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
        workbench.set_option("text", OptionValue::Text("   ".into())).unwrap();
        assert_eq!(workbench.run().await.unwrap(), RunStatus::Produced(1));
        assert_eq!(workbench.outputs()[0].filename, "watermarked.pdf");
    }

    #[tokio::test]
    async fn completed_run_replaces_outputs_and_clears_progress() {
        let (mut workbench, recorder) = bench(Readiness::Ready, true);
        workbench.select_tool("rotate-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();
        assert_eq!(workbench.run().await.unwrap(), RunStatus::Produced(1));
        assert_eq!(workbench.outputs()[0].filename, "rotated.pdf");
        assert_eq!(recorder.events().last().map(String::as_str), Some("<clear>"));
    }

    #[tokio::test]
    async fn failed_run_keeps_files_and_options() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("watermark-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
        workbench.set_option("opacity", OptionValue::Text("0.3".into())).unwrap();

        let err = workbench.run().await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter watermark text.");
        assert_eq!(workbench.files().len(), 1);
        assert_eq!(workbench.options().watermark().opacity, 0.3);
        assert!(!workbench.is_running());
    }

    #[test]
    fn organize_setup_failure_falls_back_to_default_mode() {
        let (mut workbench, recorder) = bench(Readiness::Ready, false);
        workbench.select_tool("organize-pdf").unwrap();
        workbench.registry.install(Engine::Rendering(Arc::new(FailingRenderer)));
        let err = workbench.stage(vec![pdf("a.pdf", 3)]).unwrap_err();
        assert!(matches!(err, FolioError::RenderError(_)));
        assert_eq!(workbench.mode(), EditorMode::Default);
        assert_eq!(workbench.files().len(), 1);
        assert_eq!(recorder.events().last().map(String::as_str), Some("<clear>"));
    }

    #[test]
    fn organize_mode_follows_the_staged_count() {
        let (mut workbench, recorder) = bench(Readiness::Ready, true);
        workbench.select_tool("organize-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 3)]).unwrap();
        assert_eq!(workbench.mode(), EditorMode::Organize);
        assert!(recorder.events().contains(&"Loading pages...".to_string()));
        assert_eq!(workbench.organizer().unwrap().len(), 3);

        workbench.unstage(0).unwrap();
        assert_eq!(workbench.mode(), EditorMode::Default);
        assert!(workbench.organizer().is_none());
        assert!(matches!(workbench.organizer_mut(), Err(FolioError::WrongMode(_))));
    }

    #[test]
    fn annotations_stay_with_their_document() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("edit-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();
        assert_eq!(workbench.mode(), EditorMode::Edit);
        let annotator = workbench.annotator_mut().unwrap();
        annotator.add_text(Some("Note"));
        annotator.navigate(1).unwrap();
        annotator.add_text(Some("Unsaved"));

        // Leaving edit mode keeps the saved layer; the open page's edits go.
        workbench.unstage(0).unwrap();
        assert_eq!(workbench.mode(), EditorMode::Default);
        assert_eq!(workbench.annotations().map(|layer| layer.len()), Some(1));

        // The same document comes back with its overlays.
        workbench.stage(vec![pdf("a.pdf", 2)]).unwrap();
        assert!(matches!(
            workbench.annotator().unwrap().objects(),
            [OverlayObject::Text { text, .. }] if text == "Note"
        ));
        let annotator = workbench.annotator_mut().unwrap();
        annotator.navigate(1).unwrap();
        assert!(annotator.objects().is_empty());

        // A different document starts clean.
        workbench.stage(vec![pdf("b.pdf", 3)]).unwrap();
        assert!(workbench.annotator().unwrap().objects().is_empty());
        assert!(workbench.annotations().unwrap().is_empty());
    }

    #[test]
    fn tool_change_drops_session_state() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("edit-pdf").unwrap();
        workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
        workbench.annotator_mut().unwrap().add_text(None);
        let generation = workbench.generation();

        workbench.select_tool("merge-pdf").unwrap();
        assert!(workbench.files().is_empty());
        assert!(workbench.annotations().is_none());
        assert!(workbench.options().is_empty());
        assert!(workbench.generation() > generation);
    }

    #[test]
    fn unknown_options_are_rejected() {
        let (mut workbench, _) = bench(Readiness::Ready, true);
        workbench.select_tool("merge-pdf").unwrap();
        assert!(matches!(
            workbench.set_option("angle", OptionValue::Text("90".into())),
            Err(FolioError::InvalidOption { .. })
        ));
        workbench.select_tool("rotate-pdf").unwrap();
        assert!(matches!(
            workbench.set_option("colour", OptionValue::Text("red".into())),
            Err(FolioError::InvalidOption { .. })
        ));
    }
}
