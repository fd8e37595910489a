// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio pipeline.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::FolioError;

/// A named processing capability the tools depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Open, edit and serialize PDF documents.
    DocumentModel,
    /// Rasterize pages and extract their text.
    Rendering,
    /// Recognize words in a rendered page.
    TextRecognition,
    /// Lay out flowing text into new PDF pages.
    PageLayout,
    /// Read word-processing documents.
    OfficeDocument,
    /// Read spreadsheets.
    Spreadsheet,
    /// Write presentations.
    Presentation,
    /// Interactive overlay canvas for annotations and signatures.
    AnnotationCanvas,
    /// Pack several artifacts into one archive.
    Archive,
    /// Decode multi-page raster formats such as TIFF.
    RasterDecoder,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Self::DocumentModel,
        Self::Rendering,
        Self::TextRecognition,
        Self::PageLayout,
        Self::OfficeDocument,
        Self::Spreadsheet,
        Self::Presentation,
        Self::AnnotationCanvas,
        Self::Archive,
        Self::RasterDecoder,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::DocumentModel => "document-model",
            Self::Rendering => "rendering",
            Self::TextRecognition => "text-recognition",
            Self::PageLayout => "page-layout",
            Self::OfficeDocument => "office-document",
            Self::Spreadsheet => "spreadsheet",
            Self::Presentation => "presentation",
            Self::AnnotationCanvas => "annotation-canvas",
            Self::Archive => "archive",
            Self::RasterDecoder => "raster-decoder",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Capability {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|cap| cap.name() == s)
            .ok_or_else(|| FolioError::MissingCapability(s.to_string()))
    }
}

/// Presentation mode of an editing session. Always derived, never set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Upload and configure.
    #[default]
    Default,
    /// Page reordering grid.
    Organize,
    /// Page-by-page annotation canvas.
    Edit,
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Organize => "organize",
            Self::Edit => "edit",
        })
    }
}

/// Common media types produced and consumed by the built-in tools.
pub mod media {
    pub const PDF: &str = "application/pdf";
    pub const TEXT: &str = "text/plain";
    pub const JPEG: &str = "image/jpeg";
    pub const PNG: &str = "image/png";
    pub const TIFF: &str = "image/tiff";
    pub const ZIP: &str = "application/zip";
    pub const DOCX: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    pub const PPTX: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation";
    pub const OCTET_STREAM: &str = "application/octet-stream";

    /// Infer a media type from a file extension.
    pub fn from_extension(ext: &str) -> Option<&'static str> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(PDF),
            "txt" => Some(TEXT),
            "jpg" | "jpeg" => Some(JPEG),
            "png" => Some(PNG),
            "tif" | "tiff" => Some(TIFF),
            "zip" => Some(ZIP),
            "docx" => Some(DOCX),
            "doc" => Some("application/msword"),
            "xlsx" => Some(XLSX),
            "xls" => Some("application/vnd.ms-excel"),
            "pptx" => Some(PPTX),
            "ppt" => Some("application/vnd.ms-powerpoint"),
            "html" | "htm" => Some("text/html"),
            _ => None,
        }
    }
}

/// One user-supplied input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
    fingerprint: String,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        let fingerprint = hex::encode(Sha256::digest(&bytes));
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
            fingerprint,
        }
    }

    /// Build a staged file, inferring the media type from the name's extension.
    pub fn from_name(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let media_type = name
            .rsplit_once('.')
            .and_then(|(_, ext)| media::from_extension(ext))
            .unwrap_or(media::OCTET_STREAM);
        Self::new(name, media_type, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// SHA-256 of the content, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}

/// Payload of an output artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactPayload {
    Binary(Arc<[u8]>),
    Text(String),
}

impl ArtifactPayload {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One immutable output unit produced by a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub id: Uuid,
    pub payload: ArtifactPayload,
    pub filename: String,
    pub media_type: String,
    pub created_at: DateTime<Utc>,
}

impl OutputArtifact {
    pub fn binary(bytes: impl Into<Arc<[u8]>>, filename: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::with_payload(ArtifactPayload::Binary(bytes.into()), filename, media_type)
    }

    pub fn text(text: impl Into<String>, filename: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::with_payload(ArtifactPayload::Text(text.into()), filename, media_type)
    }

    fn with_payload(payload: ArtifactPayload, filename: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            filename: filename.into(),
            media_type: media_type.into(),
            created_at: Utc::now(),
        }
    }

    pub fn pdf(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self::binary(bytes, filename, media::PDF)
    }
}

/// A rendered preview of one page in the organize grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageThumbnail {
    /// Stable id, 1..N at creation, never reused.
    pub id: u32,
    /// PNG-encoded preview.
    pub preview: Arc<[u8]>,
    /// Zero-based index of the page in the source document.
    pub original_index: usize,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_names_round_trip() {
        for cap in Capability::ALL {
            assert_eq!(cap.name().parse::<Capability>().unwrap(), cap);
        }
        assert!("telepathy".parse::<Capability>().is_err());
    }

    #[test]
    fn staged_file_infers_media_type() {
        let file = StagedFile::from_name("Report.PDF", b"%PDF-1.7".to_vec());
        assert_eq!(file.media_type(), media::PDF);
        assert_eq!(file.stem(), "Report");

        let unknown = StagedFile::from_name("notes", Vec::new());
        assert_eq!(unknown.media_type(), media::OCTET_STREAM);
        assert_eq!(unknown.stem(), "notes");
    }

    #[test]
    fn fingerprint_depends_on_content_only() {
        let a = StagedFile::from_name("a.pdf", b"same".to_vec());
        let b = StagedFile::from_name("b.pdf", b"same".to_vec());
        let c = StagedFile::from_name("a.pdf", b"other".to_vec());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn text_payload_exposes_utf8_bytes() {
        let artifact = OutputArtifact::text("hello", "converted.txt", media::TEXT);
        assert_eq!(artifact.payload.as_bytes(), b"hello");
        assert_eq!(artifact.payload.len(), 5);
    }
}
