// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-tool option records and the merged options handed to a tool run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::overlay::AnnotationLayer;

/// Pages to keep, as a range expression such as `"1-3, 5, 8-10"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRangeOptions {
    pub range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOptions {
    /// Degrees added to each page's existing rotation.
    pub angle: i32,
}

impl Default for RotationOptions {
    fn default() -> Self {
        Self { angle: 90 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkOptions {
    pub text: Option<String>,
    pub opacity: f32,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            text: None,
            opacity: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureOptions {
    /// PNG-encoded signature drawing.
    pub image: Option<Arc<[u8]>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordOptions {
    pub password: Option<String>,
}

/// Where page numbers are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberPosition {
    #[default]
    BottomCenter,
    BottomRight,
    BottomLeft,
    TopCenter,
    TopRight,
    TopLeft,
}

impl NumberPosition {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bottom-center" | "bottom" => Some(Self::BottomCenter),
            "bottom-right" => Some(Self::BottomRight),
            "bottom-left" => Some(Self::BottomLeft),
            "top-center" | "top" => Some(Self::TopCenter),
            "top-right" => Some(Self::TopRight),
            "top-left" => Some(Self::TopLeft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNumberOptions {
    pub start: u32,
    pub position: NumberPosition,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            start: 1,
            position: NumberPosition::BottomCenter,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOptions {
    /// Words below this confidence are left out of the text layer.
    pub min_confidence: f32,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self { min_confidence: 0.0 }
    }
}

/// The option store: one typed record per option family.
///
/// Starts `Empty` for every tool session; editors switch it to the record
/// they need on first write.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolOptions {
    #[default]
    Empty,
    PageRange(PageRangeOptions),
    Rotation(RotationOptions),
    Watermark(WatermarkOptions),
    Signature(SignatureOptions),
    Password(PasswordOptions),
    PageNumbers(PageNumberOptions),
    Recognition(RecognitionOptions),
}

macro_rules! option_accessors {
    ($($variant:ident => $record:ty, $get:ident, $get_mut:ident;)*) => {
        impl ToolOptions {
            $(
                /// Current record, or its defaults when the store holds something else.
                pub fn $get(&self) -> $record {
                    match self {
                        Self::$variant(record) => record.clone(),
                        _ => <$record>::default(),
                    }
                }

                /// Mutable record, replacing any other contents with defaults first.
                pub fn $get_mut(&mut self) -> &mut $record {
                    if !matches!(self, Self::$variant(_)) {
                        *self = Self::$variant(<$record>::default());
                    }
                    match self {
                        Self::$variant(record) => record,
                        _ => unreachable!("variant was just assigned"),
                    }
                }
            )*
        }
    };
}

option_accessors! {
    PageRange => PageRangeOptions, page_range, page_range_mut;
    Rotation => RotationOptions, rotation, rotation_mut;
    Watermark => WatermarkOptions, watermark, watermark_mut;
    Signature => SignatureOptions, signature, signature_mut;
    Password => PasswordOptions, password, password_mut;
    PageNumbers => PageNumberOptions, page_numbers, page_numbers_mut;
    Recognition => RecognitionOptions, recognition, recognition_mut;
}

impl ToolOptions {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Options as seen by a tool's process function: the store plus whatever the
/// active sub-editor contributes.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    pub tool: ToolOptions,
    /// Zero-based source page indices in output order (organize mode).
    pub page_order: Option<Vec<usize>>,
    /// Per-page overlays to merge into the output (edit mode).
    pub annotations: Option<AnnotationLayer>,
}

impl ProcessOptions {
    pub fn new(tool: ToolOptions) -> Self {
        Self {
            tool,
            ..Self::default()
        }
    }
}
