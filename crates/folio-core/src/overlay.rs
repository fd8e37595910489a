// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Vector overlay model shared by the annotation canvas and the PDF engine.
//
// Coordinates are canvas pixels with the origin at the top-left corner, as
// drawn on a page rendered at the edit scale. Engines convert to page space
// using the snapshot's canvas dimensions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// 8-bit RGBA colour, serialized as `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|c| c.to_digit(16).map(|d| (d * 17) as u8));
                Some(Self::rgb(digits.next()??, digits.next()??, digits.next()??))
            }
            6 => Some(Self::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
            8 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: channel(&hex[6..8])?,
            }),
            _ => None,
        }
    }

    /// Components as 0.0..=1.0 fractions, for PDF colour operators.
    pub fn fractions(&self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| f32::from(c) / 255.0)
    }

    pub fn opacity(&self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid colour: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One object drawn on top of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayObject {
    Text {
        left: f32,
        top: f32,
        text: String,
        font_size: f32,
        fill: Color,
    },
    Rect {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f32,
    },
    Ellipse {
        left: f32,
        top: f32,
        rx: f32,
        ry: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f32,
    },
    Path {
        points: Vec<Point>,
        stroke: Color,
        stroke_width: f32,
    },
    Image {
        left: f32,
        top: f32,
        width: f32,
        height: f32,
        /// PNG-encoded pixels.
        png: Vec<u8>,
    },
}

impl OverlayObject {
    pub const DEFAULT_TEXT: &'static str = "Your Text Here";

    /// A text object at the default insertion point.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            left: 50.0,
            top: 50.0,
            text: text.into(),
            font_size: 24.0,
            fill: Color::BLACK,
        }
    }

    pub fn rect() -> Self {
        Self::Rect {
            left: 50.0,
            top: 50.0,
            width: 120.0,
            height: 80.0,
            fill: None,
            stroke: Some(Color::RED),
            stroke_width: 2.0,
        }
    }

    pub fn ellipse() -> Self {
        Self::Ellipse {
            left: 50.0,
            top: 50.0,
            rx: 60.0,
            ry: 40.0,
            fill: None,
            stroke: Some(Color::RED),
            stroke_width: 2.0,
        }
    }

    /// A freehand stroke in the default brush.
    pub fn path(points: Vec<Point>) -> Self {
        Self::Path {
            points,
            stroke: Color::BLACK,
            stroke_width: 3.0,
        }
    }
}

/// Serialized state of one page's overlay canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySnapshot {
    /// Canvas width in pixels at the time of the snapshot.
    pub width: u32,
    /// Canvas height in pixels at the time of the snapshot.
    pub height: u32,
    pub objects: Vec<OverlayObject>,
}

impl OverlaySnapshot {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(FolioError::from)
    }
}

/// Sparse per-page overlays, keyed by 1-based page number.
pub type AnnotationLayer = BTreeMap<u32, OverlaySnapshot>;
