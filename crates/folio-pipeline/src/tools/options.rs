// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Option editors of the built-in tools.

use folio_core::error::{FolioError, Result};
use folio_core::{NumberPosition, ToolOptions};

use crate::tool::{FieldKind, OptionEditor, OptionField, OptionValue};

const ANGLES: &[&str] = &["90", "180", "270"];
const POSITIONS: &[&str] = &[
    "bottom-center",
    "bottom-right",
    "bottom-left",
    "top-center",
    "top-right",
    "top-left",
];

fn invalid(key: &str, reason: impl Into<String>) -> FolioError {
    FolioError::InvalidOption {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn text(key: &str, value: OptionValue) -> Result<String> {
    match value {
        OptionValue::Text(text) => Ok(text.trim().to_string()),
        OptionValue::Bytes(_) => Err(invalid(key, "expected text")),
    }
}

/// `None` for blank input.
fn optional_text(key: &str, value: OptionValue) -> Result<Option<String>> {
    let text = text(key, value)?;
    Ok((!text.is_empty()).then_some(text))
}

/// Kept exactly as typed; only the empty string means unset.
fn verbatim_text(key: &str, value: OptionValue) -> Result<Option<String>> {
    match value {
        OptionValue::Text(text) => Ok((!text.is_empty()).then_some(text)),
        OptionValue::Bytes(_) => Err(invalid(key, "expected text")),
    }
}

fn fraction(key: &str, value: OptionValue, min: f32) -> Result<f32> {
    let raw = text(key, value)?;
    let parsed: f32 = raw
        .parse()
        .map_err(|_| invalid(key, format!("{raw:?} is not a number")))?;
    if !(min..=1.0).contains(&parsed) {
        return Err(invalid(key, format!("must be between {min} and 1")));
    }
    Ok(parsed)
}

// -- Page range ---------------------------------------------------------------

pub static PAGE_RANGE: OptionEditor = OptionEditor {
    fields: &[OptionField {
        key: "range",
        label: "Pages (e.g., 1-3, 5, 7-9)",
        kind: FieldKind::Text,
    }],
    apply: apply_page_range,
};

fn apply_page_range(options: &mut ToolOptions, key: &str, value: OptionValue) -> Result<()> {
    options.page_range_mut().range = optional_text(key, value)?;
    Ok(())
}

// -- Rotation -----------------------------------------------------------------

pub static ROTATION: OptionEditor = OptionEditor {
    fields: &[OptionField {
        key: "angle",
        label: "Rotation",
        kind: FieldKind::Choice(ANGLES),
    }],
    apply: apply_rotation,
};

fn apply_rotation(options: &mut ToolOptions, key: &str, value: OptionValue) -> Result<()> {
    let raw = text(key, value)?;
    if !ANGLES.contains(&raw.as_str()) {
        return Err(invalid(key, format!("must be one of {}", ANGLES.join(", "))));
    }
    options.rotation_mut().angle = raw
        .parse()
        .map_err(|_| invalid(key, format!("{raw:?} is not a number")))?;
    Ok(())
}

// -- Watermark ----------------------------------------------------------------

pub static WATERMARK: OptionEditor = OptionEditor {
    fields: &[
        OptionField {
            key: "text",
            label: "Watermark text",
            kind: FieldKind::Text,
        },
        OptionField {
            key: "opacity",
            label: "Opacity",
            kind: FieldKind::Number,
        },
    ],
    apply: apply_watermark,
};

fn apply_watermark(options: &mut ToolOptions, key: &str, value: OptionValue) -> Result<()> {
    match key {
        "text" => options.watermark_mut().text = verbatim_text(key, value)?,
        "opacity" => options.watermark_mut().opacity = fraction(key, value, 0.1)?,
        _ => return Err(invalid(key, "unknown watermark option")),
    }
    Ok(())
}

// -- Signature ----------------------------------------------------------------

pub static SIGNATURE: OptionEditor = OptionEditor {
    fields: &[OptionField {
        key: "signature",
        label: "Signature",
        kind: FieldKind::Image,
    }],
    apply: apply_signature,
};

fn apply_signature(options: &mut ToolOptions, key: &str, value: OptionValue) -> Result<()> {
    match value {
        OptionValue::Bytes(png) if !png.is_empty() => options.signature_mut().image = Some(png),
        OptionValue::Bytes(_) => options.signature_mut().image = None,
        OptionValue::Text(_) => return Err(invalid(key, "expected an image")),
    }
    Ok(())
}

// -- Password -----------------------------------------------------------------

pub static PASSWORD: OptionEditor = OptionEditor {
    fields: &[OptionField {
        key: "password",
        label: "Password",
        kind: FieldKind::Text,
    }],
    apply: apply_password,
};

fn apply_password(options: &mut ToolOptions, key: &str, value: OptionValue) -> Result<()> {
    // Passwords keep their whitespace.
    let password = match value {
        OptionValue::Text(password) => password,
        OptionValue::Bytes(_) => return Err(invalid(key, "expected text")),
    };
    options.password_mut().password = (!password.is_empty()).then_some(password);
    Ok(())
}

// -- Page numbers -------------------------------------------------------------

pub static PAGE_NUMBERS: OptionEditor = OptionEditor {
    fields: &[
        OptionField {
            key: "start",
            label: "First number",
            kind: FieldKind::Number,
        },
        OptionField {
            key: "position",
            label: "Position",
            kind: FieldKind::Choice(POSITIONS),
        },
    ],
    apply: apply_page_numbers,
};

fn apply_page_numbers(options: &mut ToolOptions, key: &str, value: OptionValue) -> Result<()> {
    let raw = text(key, value)?;
    match key {
        "start" => {
            options.page_numbers_mut().start = raw
                .parse()
                .map_err(|_| invalid(key, format!("{raw:?} is not a whole number")))?;
        }
        "position" => {
            options.page_numbers_mut().position = NumberPosition::parse(&raw)
                .ok_or_else(|| invalid(key, format!("must be one of {}", POSITIONS.join(", "))))?;
        }
        _ => return Err(invalid(key, "unknown page number option")),
    }
    Ok(())
}

// -- Recognition --------------------------------------------------------------

pub static RECOGNITION: OptionEditor = OptionEditor {
    fields: &[OptionField {
        key: "min-confidence",
        label: "Minimum confidence",
        kind: FieldKind::Number,
    }],
    apply: apply_recognition,
};

fn apply_recognition(options: &mut ToolOptions, key: &str, value: OptionValue) -> Result<()> {
    options.recognition_mut().min_confidence = fraction(key, value, 0.0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(editor: &OptionEditor, options: &mut ToolOptions, key: &str, value: &str) -> Result<()> {
        (editor.apply)(options, key, OptionValue::Text(value.to_string()))
    }

    #[test]
    fn watermark_fields_share_one_record() {
        let mut options = ToolOptions::Empty;
        set(&WATERMARK, &mut options, "text", " DRAFT ").unwrap();
        set(&WATERMARK, &mut options, "opacity", "0.8").unwrap();
        let watermark = options.watermark();
        assert_eq!(watermark.text.as_deref(), Some(" DRAFT "));
        assert_eq!(watermark.opacity, 0.8);
    }

    #[test]
    fn watermark_text_is_kept_as_typed() {
        let mut options = ToolOptions::Empty;
        set(&WATERMARK, &mut options, "text", "   ").unwrap();
        assert_eq!(options.watermark().text.as_deref(), Some("   "));
        set(&WATERMARK, &mut options, "text", "").unwrap();
        assert_eq!(options.watermark().text, None);
    }

    #[test]
    fn out_of_range_values_leave_the_store_alone() {
        let mut options = ToolOptions::Empty;
        assert!(set(&WATERMARK, &mut options, "opacity", "0.05").is_err());
        assert!(set(&ROTATION, &mut options, "angle", "45").is_err());
        assert!(set(&PAGE_NUMBERS, &mut options, "position", "middle").is_err());
        assert!(options.is_empty());
    }

    #[test]
    fn blank_text_clears() {
        let mut options = ToolOptions::Empty;
        set(&PAGE_RANGE, &mut options, "range", "1-3").unwrap();
        set(&PAGE_RANGE, &mut options, "range", "  ").unwrap();
        assert_eq!(options.page_range().range, None);
    }

    #[test]
    fn page_number_options_parse() {
        let mut options = ToolOptions::Empty;
        set(&PAGE_NUMBERS, &mut options, "start", "5").unwrap();
        set(&PAGE_NUMBERS, &mut options, "position", "top-right").unwrap();
        assert_eq!(options.page_numbers().start, 5);
        assert_eq!(options.page_numbers().position, NumberPosition::TopRight);
    }

    #[test]
    fn signature_takes_bytes_only() {
        let mut options = ToolOptions::Empty;
        let png: std::sync::Arc<[u8]> = vec![1u8, 2, 3].into();
        (SIGNATURE.apply)(&mut options, "signature", OptionValue::Bytes(png.clone())).unwrap();
        assert_eq!(options.signature().image, Some(png));
        assert!(set(&SIGNATURE, &mut options, "signature", "scribble").is_err());
    }
}
