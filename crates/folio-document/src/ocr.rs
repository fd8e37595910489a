// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word-level text recognition with ocrs.
//
// Only available with the `ocr` feature. The engine needs the detection and
// recognition models (`text-detection.rten`, `text-recognition.rten`), by
// default from `$XDG_CACHE_HOME/ocrs` where `ocrs-cli` downloads them.
// Build `ocrs` and `rten` in release mode; debug builds are very slow.

use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use tracing::{debug, info, instrument};

use crate::traits::{RecognizedWord, TextRecognizer};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where the two model files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl ModelPaths {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (role, path) in [("detection", &self.detection), ("recognition", &self.recognition)] {
            if !path.exists() {
                return Err(FolioError::OcrError(format!(
                    "{} model not found at {}; run `ocrs-cli` once to download the models",
                    role,
                    path.display()
                )));
            }
        }
        Ok(())
    }

    /// Both model files are present.
    pub fn available(&self) -> bool {
        self.detection.exists() && self.recognition.exists()
    }
}

fn load_model(role: &str, path: &Path) -> Result<Model> {
    info!(role, path = %path.display(), "Loading OCR model");
    Model::load_file(path).map_err(|err| {
        FolioError::OcrError(format!("failed to load {} model from {}: {}", role, path.display(), err))
    })
}

/// Recognizes words and their boxes. Load once, reuse for every page.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    #[instrument(skip_all, fields(
        detection = %paths.detection.display(),
        recognition = %paths.recognition.display(),
    ))]
    pub fn new(paths: &ModelPaths) -> Result<Self> {
        paths.validate()?;
        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(load_model("detection", &paths.detection)?),
            recognition_model: Some(load_model("recognition", &paths.recognition)?),
            ..Default::default()
        })
        .map_err(|err| FolioError::OcrError(format!("failed to initialise OCR engine: {}", err)))?;
        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(&ModelPaths::default())
    }
}

impl TextRecognizer for OcrsRecognizer {
    #[instrument(skip_all, fields(width = page.width(), height = page.height()))]
    fn recognize(&self, page: &DynamicImage) -> Result<Vec<RecognizedWord>> {
        let rgb = page.to_rgb8();
        let (width, height) = rgb.dimensions();
        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            FolioError::OcrError(format!("failed to create image source ({}x{}): {}", width, height, err))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| FolioError::OcrError(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| FolioError::OcrError(format!("word detection failed: {}", err)))?;
        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| FolioError::OcrError(format!("line recognition failed: {}", err)))?;

        let words: Vec<RecognizedWord> = lines
            .iter()
            .flatten()
            .flat_map(|line| line.words())
            .filter_map(|word| {
                let text = word.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                let bounds = word.bounding_rect();
                Some(RecognizedWord {
                    text,
                    left: bounds.left(),
                    top: bounds.top(),
                    width: bounds.width(),
                    height: bounds.height(),
                    // ocrs does not expose per-word confidence.
                    confidence: None,
                })
            })
            .collect();

        debug!(detected = word_rects.len(), recognized = words.len(), "OCR complete");
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_paths_from_dir() {
        let paths = ModelPaths::from_dir("/tmp/my-models");
        assert_eq!(paths.detection, PathBuf::from("/tmp/my-models/text-detection.rten"));
        assert_eq!(paths.recognition, PathBuf::from("/tmp/my-models/text-recognition.rten"));
    }

    #[test]
    fn missing_models_fail_validation() {
        let paths = ModelPaths::from_dir("/nonexistent/ocr-models");
        assert!(!paths.available());
        assert!(matches!(paths.validate(), Err(FolioError::OcrError(_))));
        assert!(OcrsRecognizer::new(&paths).is_err());
    }

    #[test]
    fn default_paths_end_with_model_names() {
        let paths = ModelPaths::default();
        assert!(paths.detection.ends_with(DETECTION_MODEL_FILENAME));
        assert!(paths.recognition.ends_with(RECOGNITION_MODEL_FILENAME));
    }
}
