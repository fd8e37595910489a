// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Validation --
    #[error("please select only {accepted} files (rejected: {})", .rejected.join(", "))]
    Validation {
        accepted: String,
        rejected: Vec<String>,
    },

    #[error("invalid value for option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },

    // -- Readiness --
    #[error("processing capabilities are still loading")]
    ReadinessPending,

    #[error("processing capabilities failed to load: {}", .0.join(", "))]
    ReadinessFailed(Vec<String>),

    #[error("required capability is not available: {0}")]
    MissingCapability(String),

    // -- Preconditions --
    #[error("{0}")]
    Precondition(String),

    #[error("no files staged")]
    NoFilesStaged,

    #[error("a processing run is already in flight")]
    RunInFlight,

    #[error("operation requires the {0} editor")]
    WrongMode(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    // -- Engines --
    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("page rendering failed: {0}")]
    RenderError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    #[error("archive operation failed: {0}")]
    ArchiveError(String),

    #[error("office document processing failed: {0}")]
    OfficeError(String),

    #[error("annotation canvas error: {0}")]
    CanvasError(String),

    #[error("{0} is not implemented yet")]
    NotImplemented(String),

    #[error("processing task failed: {0}")]
    TaskFailed(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which branch of the error taxonomy an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Candidate file or option value rejected; nothing changed.
    Validation,
    /// Capabilities never became available; blocks every tool.
    Readiness,
    /// A capability vanished between readiness and the call that needed it.
    MissingCapability,
    /// Required input missing; no engine was touched.
    Precondition,
    /// The underlying transformation failed.
    Engine,
}

impl FolioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } | Self::InvalidOption { .. } => ErrorKind::Validation,
            Self::ReadinessPending | Self::ReadinessFailed(_) => ErrorKind::Readiness,
            Self::MissingCapability(_) => ErrorKind::MissingCapability,
            Self::Precondition(_)
            | Self::NoFilesStaged
            | Self::RunInFlight
            | Self::WrongMode(_)
            | Self::UnknownTool(_) => ErrorKind::Precondition,
            Self::UnsupportedDocument(_)
            | Self::PdfError(_)
            | Self::ImageError(_)
            | Self::RenderError(_)
            | Self::OcrError(_)
            | Self::ArchiveError(_)
            | Self::OfficeError(_)
            | Self::CanvasError(_)
            | Self::NotImplemented(_)
            | Self::TaskFailed(_)
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Engine,
        }
    }

    /// Shorthand for a precondition failure with a user-facing message.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_rejected_files() {
        let err = FolioError::Validation {
            accepted: "application/pdf".into(),
            rejected: vec!["a.png".into(), "b.txt".into()],
        };
        assert_eq!(
            err.to_string(),
            "please select only application/pdf files (rejected: a.png, b.txt)"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn readiness_failure_names_missing_capabilities() {
        let err = FolioError::ReadinessFailed(vec!["rendering".into()]);
        assert!(err.to_string().contains("rendering"));
        assert_eq!(err.kind(), ErrorKind::Readiness);
    }

    #[test]
    fn precondition_displays_bare_message() {
        let err = FolioError::precondition("Please draw a signature.");
        assert_eq!(err.to_string(), "Please draw a signature.");
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn io_errors_are_engine_failures() {
        let err: FolioError = std::io::Error::other("disk full").into();
        assert_eq!(err.kind(), ErrorKind::Engine);
    }
}
