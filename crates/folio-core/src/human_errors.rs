// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Nothing is retried automatically; the severity only tells the host how to
// present the message and whether trying again by hand is worthwhile.

use crate::error::FolioError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Trying again by hand may work.
    Transient,
    /// The user must supply or change something first.
    ActionRequired,
    /// Nothing the user does in this session will fix it.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

impl HumanError {
    fn new(message: impl Into<String>, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity,
        }
    }
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        // -- Validation --
        FolioError::Validation { accepted, .. } => HumanError::new(
            format!("Please select only {accepted} files."),
            "Remove the files that don't match and try again.",
            Severity::ActionRequired,
        ),

        FolioError::InvalidOption { key, reason } => HumanError::new(
            format!("The \"{key}\" setting isn't valid."),
            format!("Check the value and try again. ({reason})"),
            Severity::ActionRequired,
        ),

        // -- Readiness --
        FolioError::ReadinessPending => HumanError::new(
            "The tools are still loading.",
            "Wait a moment, then try again.",
            Severity::Transient,
        ),

        FolioError::ReadinessFailed(missing) => HumanError::new(
            "Some processing components failed to load.",
            format!(
                "Please reload the application. Missing: {}",
                missing.join(", ")
            ),
            Severity::Permanent,
        ),

        FolioError::MissingCapability(name) => HumanError::new(
            "This tool isn't available right now.",
            format!("The {name} component is missing. Reload the application and try again."),
            Severity::Transient,
        ),

        // -- Preconditions --
        FolioError::Precondition(detail) => {
            HumanError::new(detail.clone(), "Fill in the missing option, then run the tool again.", Severity::ActionRequired)
        }

        FolioError::NoFilesStaged => HumanError::new(
            "No files selected.",
            "Add at least one file, then run the tool.",
            Severity::ActionRequired,
        ),

        FolioError::RunInFlight => HumanError::new(
            "This tool is still working.",
            "Wait for the current run to finish.",
            Severity::Transient,
        ),

        FolioError::WrongMode(mode) => HumanError::new(
            format!("That only works in the {mode} editor."),
            "Open a single document with the matching tool first.",
            Severity::ActionRequired,
        ),

        FolioError::UnknownTool(id) => HumanError::new(
            "That tool doesn't exist.",
            format!("Pick a tool from the list. (Requested: {id})"),
            Severity::ActionRequired,
        ),

        // -- Engines --
        FolioError::UnsupportedDocument(detail) => HumanError::new(
            "This document can't be processed.",
            format!("Try saving it in a different format first. ({detail})"),
            Severity::Permanent,
        ),

        FolioError::PdfError(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged or encrypted. Try the Repair tool, or a different file.",
            Severity::Permanent,
        ),

        FolioError::ImageError(_) => HumanError::new(
            "There's a problem with this image.",
            "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.",
            Severity::Permanent,
        ),

        FolioError::RenderError(_) => HumanError::new(
            "We couldn't display this page.",
            "The file may be damaged. Try the Repair tool first.",
            Severity::Permanent,
        ),

        FolioError::OcrError(_) => HumanError::new(
            "Text recognition didn't work on this document.",
            "Try a clearer scan, or check that the recognition models are installed.",
            Severity::Transient,
        ),

        FolioError::ArchiveError(_) => HumanError::new(
            "We couldn't package the results.",
            "Try again. If this keeps happening, export fewer pages at once.",
            Severity::Transient,
        ),

        FolioError::OfficeError(_) => HumanError::new(
            "We couldn't read this office document.",
            "Make sure it is a modern .docx or .xlsx file and isn't password protected.",
            Severity::Permanent,
        ),

        FolioError::CanvasError(_) => HumanError::new(
            "The drawing canvas had a problem.",
            "Close the editor and open the document again.",
            Severity::Transient,
        ),

        FolioError::NotImplemented(tool) => HumanError::new(
            format!("{tool} isn't available yet."),
            "Choose a different tool for now.",
            Severity::Permanent,
        ),

        FolioError::TaskFailed(_) => HumanError::new(
            "The tool stopped unexpectedly.",
            "Try again. If this keeps happening, please report it.",
            Severity::Transient,
        ),

        // -- Storage --
        FolioError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "Folio doesn't have permission to use that file.",
                "Check the file permissions, or choose a different folder.",
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your disk may be full.",
                Severity::Transient,
            ),
        },

        FolioError::Serialization(_) => HumanError::new(
            "Folio had an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            Severity::Transient,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_message_is_shown_verbatim() {
        let human = humanize_error(&FolioError::precondition("Please enter watermark text."));
        assert_eq!(human.message, "Please enter watermark text.");
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn readiness_failure_is_permanent() {
        let err = FolioError::ReadinessFailed(vec!["rendering".into(), "archive".into()]);
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.suggestion.contains("rendering, archive"));
    }

    #[test]
    fn validation_names_accepted_types() {
        let err = FolioError::Validation {
            accepted: "image/jpeg".into(),
            rejected: vec!["scan.pdf".into()],
        };
        let human = humanize_error(&err);
        assert_eq!(human.message, "Please select only image/jpeg files.");
    }

    #[test]
    fn missing_file_is_action_required() {
        let err: FolioError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn corrupt_pdf_is_permanent() {
        let human = humanize_error(&FolioError::PdfError("invalid xref".into()));
        assert_eq!(human.severity, Severity::Permanent);
    }
}
