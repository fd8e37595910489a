// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end sessions through the workbench: organize, annotate, readiness
// failure, and an empty run.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use folio_core::error::{FolioError, Result};
use folio_core::{Capability, EditorMode, OverlayObject, PipelineConfig, ProcessOptions, StagedFile, media};
use folio_document::test_utils::{FixtureRenderer, page_labels, page_strings, sample_pdf};
use folio_document::{
    DocxReader, ImageRasterDecoder, LopdfEngine, PptxWriter, PrintpdfLayout, VectorCanvasEngine, XlsxReader, ZipArchiver,
};
use folio_pipeline::{
    CapabilityRegistry, Engine, ProcessOutcome, ProgressSink, Readiness, ReadinessGate, RunStatus, ToolContext,
    ToolDescriptor, ToolRegistry, Workbench, check_readiness,
};
use tokio::sync::watch;

// -- Fixtures -----------------------------------------------------------------

/// Every capability except text recognition.
fn nine_engines() -> CapabilityRegistry {
    let registry = CapabilityRegistry::new();
    registry.install(Engine::DocumentModel(Arc::new(LopdfEngine::new())));
    registry.install(Engine::Rendering(Arc::new(FixtureRenderer)));
    registry.install(Engine::PageLayout(Arc::new(PrintpdfLayout::new())));
    registry.install(Engine::OfficeDocument(Arc::new(DocxReader)));
    registry.install(Engine::Spreadsheet(Arc::new(XlsxReader)));
    registry.install(Engine::Presentation(Arc::new(PptxWriter::default())));
    registry.install(Engine::AnnotationCanvas(Arc::new(VectorCanvasEngine)));
    registry.install(Engine::Archive(Arc::new(ZipArchiver)));
    registry.install(Engine::RasterDecoder(Arc::new(ImageRasterDecoder)));
    registry
}

fn ready_workbench(tools: ToolRegistry) -> Workbench {
    let (_gate, readiness) = watch::channel(Readiness::Ready);
    Workbench::new(tools, nine_engines(), readiness, Arc::new(PipelineConfig::default()))
}

fn pdf(name: &str, pages: u32) -> StagedFile {
    StagedFile::new(name, media::PDF, sample_pdf(pages))
}

#[derive(Default)]
struct Recorder {
    reports: AtomicUsize,
    clears: AtomicUsize,
}

impl ProgressSink for Recorder {
    fn report(&self, _message: &str) {
        self.reports.fetch_add(1, Ordering::SeqCst);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

// -- A: organize --------------------------------------------------------------

#[tokio::test]
async fn deleting_a_thumbnail_drops_that_page() {
    let mut workbench = ready_workbench(ToolRegistry::builtin());
    workbench.select_tool("organize-pdf").unwrap();
    workbench.stage(vec![pdf("three.pdf", 3)]).unwrap();
    assert_eq!(workbench.mode(), EditorMode::Organize);

    assert!(workbench.organizer_mut().unwrap().delete(2));
    assert_eq!(workbench.run().await.unwrap(), RunStatus::Produced(1));

    let output = &workbench.outputs()[0];
    assert_eq!(output.filename, "organized.pdf");
    assert_eq!(page_labels(output.payload.as_bytes()), vec!["Page 1", "Page 3"]);
}

#[tokio::test]
async fn reordered_pages_come_out_in_screen_order() {
    let mut workbench = ready_workbench(ToolRegistry::builtin());
    workbench.select_tool("organize-pdf").unwrap();
    workbench.stage(vec![pdf("three.pdf", 3)]).unwrap();

    workbench.organizer_mut().unwrap().reorder(2, 0);
    workbench.run().await.unwrap();
    assert_eq!(
        page_labels(workbench.outputs()[0].payload.as_bytes()),
        vec!["Page 3", "Page 1", "Page 2"]
    );
}

// -- B: annotate --------------------------------------------------------------

#[tokio::test]
async fn annotations_survive_page_navigation() {
    let mut workbench = ready_workbench(ToolRegistry::builtin());
    workbench.select_tool("edit-pdf").unwrap();
    workbench.stage(vec![pdf("two.pdf", 2)]).unwrap();
    assert_eq!(workbench.mode(), EditorMode::Edit);

    let editor = workbench.annotator_mut().unwrap();
    editor.add_text(None);
    editor.navigate(1).unwrap();
    assert_eq!(editor.current_page(), 2);
    assert!(editor.objects().is_empty());
    editor.navigate(-1).unwrap();
    assert_eq!(editor.current_page(), 1);
    assert!(matches!(
        editor.objects(),
        [OverlayObject::Text { text, .. }] if text == OverlayObject::DEFAULT_TEXT
    ));

    workbench.run().await.unwrap();
    let strings = page_strings(workbench.outputs()[0].payload.as_bytes());
    assert!(strings[0].iter().any(|s| s == OverlayObject::DEFAULT_TEXT));
    assert!(!strings[1].iter().any(|s| s == OverlayObject::DEFAULT_TEXT));
}

// -- C: readiness failure -----------------------------------------------------

#[tokio::test]
async fn readiness_fails_listing_the_one_missing_capability() {
    let registry = nine_engines();
    let outcome = check_readiness(&registry, &Capability::ALL, Duration::from_millis(1), 3).await;
    assert_eq!(outcome, Readiness::Failed(vec![Capability::TextRecognition]));

    let config = PipelineConfig {
        required_capabilities: Capability::ALL.to_vec(),
        readiness_poll_interval_ms: 1,
        readiness_max_attempts: 3,
        ..PipelineConfig::default()
    };
    let gate = ReadinessGate::new(registry.clone(), &config);
    let mut workbench = Workbench::new(
        ToolRegistry::builtin(),
        registry,
        gate.subscribe(),
        Arc::new(config.clone()),
    );
    gate.run().await;

    let err = workbench.wait_until_ready().await.unwrap_err();
    assert!(matches!(err, FolioError::ReadinessFailed(ref missing) if missing == &["text-recognition"]));

    workbench.select_tool("merge-pdf").unwrap();
    workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
    assert!(matches!(workbench.begin_run(), Err(FolioError::ReadinessFailed(_))));
}

// -- D: empty run -------------------------------------------------------------

static CALLS: AtomicUsize = AtomicUsize::new(0);

fn counting(_: &ToolContext, _: &[StagedFile], _: &ProcessOptions) -> Result<ProcessOutcome> {
    CALLS.fetch_add(1, Ordering::SeqCst);
    Ok(ProcessOutcome::Artifacts(Vec::new()))
}

#[tokio::test]
async fn empty_run_never_reaches_the_tool() {
    let tool = ToolDescriptor {
        id: "counting",
        title: "Counting",
        description: "Counts its invocations.",
        accept: media::PDF,
        multiple_files: true,
        is_new: false,
        options: None,
        on_select: None,
        process: counting,
    };
    let recorder = Arc::new(Recorder::default());
    let mut workbench = ready_workbench(ToolRegistry::new(vec![tool]).unwrap()).with_progress(recorder.clone());
    workbench.select_tool("counting").unwrap();
    let reports_before = recorder.reports.load(Ordering::SeqCst);

    let err = workbench.run().await.unwrap_err();
    assert!(matches!(err, FolioError::NoFilesStaged));
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(recorder.reports.load(Ordering::SeqCst), reports_before);
    assert!(!workbench.is_running());

    // Once a file is staged the same tool runs exactly once.
    workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
    let clears_before = recorder.clears.load(Ordering::SeqCst);
    assert_eq!(workbench.run().await.unwrap(), RunStatus::Produced(0));
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.clears.load(Ordering::SeqCst), clears_before + 1);
}

// -- Conversions --------------------------------------------------------------

#[tokio::test]
async fn word_to_pdf_saves_into_the_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        output_dir: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let (_gate, readiness) = watch::channel(Readiness::Ready);
    let mut workbench = Workbench::new(ToolRegistry::builtin(), nine_engines(), readiness, Arc::new(config));

    workbench.select_tool("word-to-pdf").unwrap();
    workbench
        .stage(vec![StagedFile::from_name("letter.docx", docx(&["Dear reader,", "Goodbye."]))])
        .unwrap();
    let status = workbench.run().await.unwrap();

    let expected = dir.path().join("letter.pdf");
    assert_eq!(status, RunStatus::Saved(vec![expected.clone()]));
    assert!(std::fs::read(&expected).unwrap().starts_with(b"%PDF"));
    assert!(workbench.outputs().is_empty());
}

#[tokio::test]
async fn pdf_to_jpg_zips_multi_page_documents() {
    let mut workbench = ready_workbench(ToolRegistry::builtin());
    workbench.select_tool("pdf-to-jpg").unwrap();
    workbench.stage(vec![pdf("scan.pdf", 2)]).unwrap();
    workbench.run().await.unwrap();
    let output = &workbench.outputs()[0];
    assert_eq!(output.filename, "images.zip");
    assert_eq!(output.media_type, media::ZIP);

    workbench.stage(vec![pdf("single.pdf", 1)]).unwrap();
    workbench.run().await.unwrap();
    assert_eq!(workbench.outputs()[0].filename, "single.jpg");
}

#[tokio::test]
async fn pdf_to_word_joins_page_text() {
    let mut workbench = ready_workbench(ToolRegistry::builtin());
    workbench.select_tool("pdf-to-word").unwrap();
    workbench.stage(vec![pdf("two.pdf", 2)]).unwrap();
    workbench.run().await.unwrap();
    let output = &workbench.outputs()[0];
    assert_eq!(output.filename, "converted.txt");
    assert_eq!(output.payload.as_bytes(), b"Page 1\n\nPage 2\n\n");
}

#[tokio::test]
async fn placeholder_tools_report_not_implemented() {
    let mut workbench = ready_workbench(ToolRegistry::builtin());
    workbench.select_tool("pdf-to-pdfa").unwrap();
    workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
    let err = workbench.run().await.unwrap_err();
    assert!(matches!(err, FolioError::NotImplemented(ref title) if title == "PDF to PDF/A"));
}

#[tokio::test]
async fn ocr_without_a_recognizer_is_a_missing_capability() {
    let mut workbench = ready_workbench(ToolRegistry::builtin());
    workbench.select_tool("ocr-pdf").unwrap();
    workbench.stage(vec![pdf("a.pdf", 1)]).unwrap();
    let err = workbench.run().await.unwrap_err();
    assert!(matches!(err, FolioError::MissingCapability(ref name) if name == "text-recognition"));
    assert_eq!(workbench.files().len(), 1);
}

/// A minimal word-processing document with one paragraph per entry.
fn docx(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let body: String = paragraphs
        .iter()
        .map(|text| format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
