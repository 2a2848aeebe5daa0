//! Label surface
//!
//! Retained description of a rendered label in logical pixels. Rasterizers
//! paint it at any oversampling factor.

use super::qr::QrMatrix;

/// Axis-aligned rectangle in logical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Text appearance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in logical pixels
    pub size: f32,
    pub color: [u8; 3],
    pub bold: bool,
    /// Extra advance between glyphs in logical pixels
    pub letter_spacing: f32,
}

/// One drawable part of a label
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceElement {
    /// A single line of text centred horizontally inside `line` and
    /// vertically on the line box
    Text {
        text: String,
        line: SurfaceRect,
        style: TextStyle,
    },
    /// Outline of the box around a QR code
    Frame {
        rect: SurfaceRect,
        color: [u8; 3],
        stroke: f32,
    },
    /// QR modules stretched over `rect`
    Qr {
        payload: String,
        rect: SurfaceRect,
        matrix: QrMatrix,
        color: [u8; 3],
    },
}

/// A complete square label
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSurface {
    /// Edge length in logical pixels
    pub size: u32,
    pub elements: Vec<SurfaceElement>,
}

impl LabelSurface {
    /// QR payloads in drawing order (username first)
    pub fn payloads(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|element| match element {
                SurfaceElement::Qr { payload, .. } => Some(payload.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Text lines in drawing order
    pub fn texts(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter_map(|element| match element {
                SurfaceElement::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Lowest edge of any element
    pub fn content_bottom(&self) -> f32 {
        self.elements
            .iter()
            .map(|element| match element {
                SurfaceElement::Text { line, .. } => line.bottom(),
                SurfaceElement::Frame { rect, .. } | SurfaceElement::Qr { rect, .. } => rect.bottom(),
            })
            .fold(0.0, f32::max)
    }
}
