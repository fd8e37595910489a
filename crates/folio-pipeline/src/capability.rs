// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability registry: the engines the host has installed, by name.
//
// The registry is handed to the pipeline at construction. The host may keep
// installing engines after that (the readiness gate polls for them), so the
// slots sit behind a lock and clones share the same slots.

use std::sync::{Arc, RwLock};

use folio_core::error::{FolioError, Result};
use folio_core::types::Capability;
use folio_document::traits::{
    ArchiveWriter, CanvasEngine, DocumentEngine, OfficeReader, PageLayout, PresentationWriter, RasterDecoder,
    RenderEngine, SpreadsheetReader, TextRecognizer,
};
use tracing::info;

/// One installable engine, tagged with the capability it provides.
#[derive(Clone)]
pub enum Engine {
    DocumentModel(Arc<dyn DocumentEngine>),
    Rendering(Arc<dyn RenderEngine>),
    TextRecognition(Arc<dyn TextRecognizer>),
    PageLayout(Arc<dyn PageLayout>),
    OfficeDocument(Arc<dyn OfficeReader>),
    Spreadsheet(Arc<dyn SpreadsheetReader>),
    Presentation(Arc<dyn PresentationWriter>),
    AnnotationCanvas(Arc<dyn CanvasEngine>),
    Archive(Arc<dyn ArchiveWriter>),
    RasterDecoder(Arc<dyn RasterDecoder>),
}

impl Engine {
    pub fn capability(&self) -> Capability {
        match self {
            Self::DocumentModel(_) => Capability::DocumentModel,
            Self::Rendering(_) => Capability::Rendering,
            Self::TextRecognition(_) => Capability::TextRecognition,
            Self::PageLayout(_) => Capability::PageLayout,
            Self::OfficeDocument(_) => Capability::OfficeDocument,
            Self::Spreadsheet(_) => Capability::Spreadsheet,
            Self::Presentation(_) => Capability::Presentation,
            Self::AnnotationCanvas(_) => Capability::AnnotationCanvas,
            Self::Archive(_) => Capability::Archive,
            Self::RasterDecoder(_) => Capability::RasterDecoder,
        }
    }
}

#[derive(Default)]
struct Slots {
    document_model: Option<Arc<dyn DocumentEngine>>,
    rendering: Option<Arc<dyn RenderEngine>>,
    text_recognition: Option<Arc<dyn TextRecognizer>>,
    page_layout: Option<Arc<dyn PageLayout>>,
    office_document: Option<Arc<dyn OfficeReader>>,
    spreadsheet: Option<Arc<dyn SpreadsheetReader>>,
    presentation: Option<Arc<dyn PresentationWriter>>,
    annotation_canvas: Option<Arc<dyn CanvasEngine>>,
    archive: Option<Arc<dyn ArchiveWriter>>,
    raster_decoder: Option<Arc<dyn RasterDecoder>>,
}

impl Slots {
    fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::DocumentModel => self.document_model.is_some(),
            Capability::Rendering => self.rendering.is_some(),
            Capability::TextRecognition => self.text_recognition.is_some(),
            Capability::PageLayout => self.page_layout.is_some(),
            Capability::OfficeDocument => self.office_document.is_some(),
            Capability::Spreadsheet => self.spreadsheet.is_some(),
            Capability::Presentation => self.presentation.is_some(),
            Capability::AnnotationCanvas => self.annotation_canvas.is_some(),
            Capability::Archive => self.archive.is_some(),
            Capability::RasterDecoder => self.raster_decoder.is_some(),
        }
    }
}

/// Shared, explicitly injected set of installed engines.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    slots: Arc<RwLock<Slots>>,
}

macro_rules! engine_getters {
    ($($name:ident => $field:ident: $trait_:ident, $cap:ident;)*) => {
        impl CapabilityRegistry {
            $(
                /// The installed engine, re-checked at call time.
                pub fn $name(&self) -> Result<Arc<dyn $trait_>> {
                    self.read()
                        .$field
                        .clone()
                        .ok_or_else(|| FolioError::MissingCapability(Capability::$cap.name().to_string()))
                }
            )*
        }
    };
}

engine_getters! {
    document_model => document_model: DocumentEngine, DocumentModel;
    rendering => rendering: RenderEngine, Rendering;
    text_recognition => text_recognition: TextRecognizer, TextRecognition;
    page_layout => page_layout: PageLayout, PageLayout;
    office_document => office_document: OfficeReader, OfficeDocument;
    spreadsheet => spreadsheet: SpreadsheetReader, Spreadsheet;
    presentation => presentation: PresentationWriter, Presentation;
    annotation_canvas => annotation_canvas: CanvasEngine, AnnotationCanvas;
    archive => archive: ArchiveWriter, Archive;
    raster_decoder => raster_decoder: RasterDecoder, RasterDecoder;
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every engine this build ships with.
    ///
    /// Rendering and text recognition are only present when the `pdfium`
    /// and `ocr` features are enabled (recognition also needs its models).
    pub fn with_builtin_engines() -> Self {
        use folio_document::{
            DocxReader, ImageRasterDecoder, LopdfEngine, PptxWriter, PrintpdfLayout, VectorCanvasEngine, XlsxReader,
            ZipArchiver,
        };

        let registry = Self::new();
        registry.install(Engine::DocumentModel(Arc::new(LopdfEngine::new())));
        registry.install(Engine::PageLayout(Arc::new(PrintpdfLayout::new())));
        registry.install(Engine::OfficeDocument(Arc::new(DocxReader)));
        registry.install(Engine::Spreadsheet(Arc::new(XlsxReader)));
        registry.install(Engine::Presentation(Arc::new(PptxWriter::default())));
        registry.install(Engine::AnnotationCanvas(Arc::new(VectorCanvasEngine)));
        registry.install(Engine::Archive(Arc::new(ZipArchiver)));
        registry.install(Engine::RasterDecoder(Arc::new(ImageRasterDecoder)));

        #[cfg(feature = "pdfium")]
        registry.install(Engine::Rendering(Arc::new(folio_document::PdfiumRenderer::new())));

        #[cfg(feature = "ocr")]
        {
            match folio_document::OcrsRecognizer::with_defaults() {
                Ok(recognizer) => registry.install(Engine::TextRecognition(Arc::new(recognizer))),
                Err(err) => tracing::warn!(error = %err, "Text recognition unavailable"),
            }
        }

        registry
    }

    /// Install or replace the engine for its capability.
    pub fn install(&self, engine: Engine) {
        let capability = engine.capability();
        let mut slots = self.slots.write().expect("capability registry lock poisoned");
        match engine {
            Engine::DocumentModel(e) => slots.document_model = Some(e),
            Engine::Rendering(e) => slots.rendering = Some(e),
            Engine::TextRecognition(e) => slots.text_recognition = Some(e),
            Engine::PageLayout(e) => slots.page_layout = Some(e),
            Engine::OfficeDocument(e) => slots.office_document = Some(e),
            Engine::Spreadsheet(e) => slots.spreadsheet = Some(e),
            Engine::Presentation(e) => slots.presentation = Some(e),
            Engine::AnnotationCanvas(e) => slots.annotation_canvas = Some(e),
            Engine::Archive(e) => slots.archive = Some(e),
            Engine::RasterDecoder(e) => slots.raster_decoder = Some(e),
        }
        info!(capability = %capability, "Capability installed");
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.read().contains(capability)
    }

    /// Required capabilities not installed, in requirement order.
    pub fn missing(&self, required: &[Capability]) -> Vec<Capability> {
        let slots = self.read();
        required.iter().copied().filter(|cap| !slots.contains(*cap)).collect()
    }

    pub fn installed(&self) -> Vec<Capability> {
        let slots = self.read();
        Capability::ALL.into_iter().filter(|cap| slots.contains(*cap)).collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Slots> {
        self.slots.read().expect("capability registry lock poisoned")
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("installed", &self.installed())
            .finish()
    }
}
