//! Label renderer
//!
//! Lays out the two QR sections of a credential label. Layout follows the
//! printed card: section label, framed QR code, then the value itself,
//! with both sections centred vertically on the square.

use std::sync::Arc;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::render::FontBook;
use crate::utils::color::hex_to_rgb_or;

use super::caption::wrap_break_all;
use super::qr::{self, QrLevel, QrMatrix};
use super::surface::{LabelSurface, SurfaceElement, SurfaceRect, TextStyle};

/// Line height of the small section labels, as a multiple of their size
const SECTION_LABEL_LINE_HEIGHT: f32 = 1.5;

/// Letter spacing of the section labels, as a multiple of their size
const SECTION_LABEL_TRACKING: f32 = 0.1;

/// Outline width of the QR frame
const FRAME_STROKE: f32 = 1.0;

/// One measured section, ready to be placed
struct Section {
    label: String,
    payload: String,
    matrix: QrMatrix,
    lines: Vec<String>,
}

/// Renders credential labels for a fixed layout and font
#[derive(Debug, Clone)]
pub struct LabelRenderer {
    layout: LayoutConfig,
    fonts: Arc<FontBook>,
    level: QrLevel,
    label_style: TextStyle,
    value_style: TextStyle,
    frame_color: [u8; 3],
    qr_color: [u8; 3],
}

impl LabelRenderer {
    pub fn new(layout: LayoutConfig, fonts: Arc<FontBook>) -> Self {
        let label_style = TextStyle {
            size: layout.section_label_size,
            color: hex_to_rgb_or(&layout.section_label_color, [0x9C, 0xA3, 0xAF]),
            bold: true,
            letter_spacing: layout.section_label_size * SECTION_LABEL_TRACKING,
        };
        let value_style = TextStyle {
            size: layout.value_text_size,
            color: hex_to_rgb_or(&layout.value_text_color, [0x37, 0x41, 0x51]),
            bold: true,
            letter_spacing: 0.0,
        };
        let frame_color = hex_to_rgb_or(&layout.qr_frame_color, [0xF3, 0xF4, 0xF6]);
        let qr_color = hex_to_rgb_or(&layout.qr_color, [0, 0, 0]);

        Self {
            layout,
            fonts,
            level: QrLevel::High,
            label_style,
            value_style,
            frame_color,
            qr_color,
        }
    }

    /// Edge length of rendered labels in logical pixels
    pub fn size(&self) -> u32 {
        self.layout.size
    }

    /// Render one label. Same inputs always give an equal surface.
    pub fn render(&self, username: &str, password: &str) -> Result<LabelSurface> {
        let user = self.section(&self.layout.username_label, username)?;
        let pass = self.section(&self.layout.password_label, password)?;

        let total = self.section_height(&user) + self.layout.section_gap + self.section_height(&pass);
        let size = self.layout.size as f32;
        let top = ((size - total) / 2.0).max(0.0);

        let mut elements = Vec::with_capacity(8);
        let bottom = self.place(user, top, &mut elements);
        self.place(pass, bottom + self.layout.section_gap, &mut elements);

        Ok(LabelSurface {
            size: self.layout.size,
            elements,
        })
    }

    fn content_width(&self) -> f32 {
        (self.layout.size as f32 - 2.0 * self.layout.padding).max(0.0)
    }

    fn value_width(&self) -> f32 {
        (self.content_width() - 2.0 * self.layout.value_inset).max(0.0)
    }

    fn label_line_height(&self) -> f32 {
        self.layout.section_label_size * SECTION_LABEL_LINE_HEIGHT
    }

    fn value_line_height(&self) -> f32 {
        self.layout.value_text_size * self.layout.value_line_height
    }

    fn frame_size(&self) -> f32 {
        self.layout.qr_size + 2.0 * self.layout.qr_frame_padding
    }

    fn section(&self, label: &str, value: &str) -> Result<Section> {
        let payload = qr::qr_payload(value).to_string();
        let matrix = qr::encode(&payload, self.level)?;

        let shown = if value.is_empty() {
            self.layout.placeholder.as_str()
        } else {
            value
        };
        let style = self.value_style;
        let lines = wrap_break_all(shown, self.value_width(), self.layout.max_value_lines, |s| {
            self.fonts.measure(s, style.size, style.letter_spacing)
        });

        Ok(Section {
            label: label.to_string(),
            payload,
            matrix,
            lines,
        })
    }

    fn section_height(&self, section: &Section) -> f32 {
        self.label_line_height()
            + self.layout.element_gap
            + self.frame_size()
            + self.layout.element_gap
            + section.lines.len() as f32 * self.value_line_height()
    }

    /// Append the section's elements starting at `y`; returns the bottom edge
    fn place(&self, section: Section, y: f32, elements: &mut Vec<SurfaceElement>) -> f32 {
        let size = self.layout.size as f32;
        let padding = self.layout.padding;
        let mut y = y;

        elements.push(SurfaceElement::Text {
            text: section.label,
            line: SurfaceRect::new(padding, y, self.content_width(), self.label_line_height()),
            style: self.label_style,
        });
        y += self.label_line_height() + self.layout.element_gap;

        let frame = self.frame_size();
        let frame_rect = SurfaceRect::new((size - frame) / 2.0, y, frame, frame);
        elements.push(SurfaceElement::Frame {
            rect: frame_rect,
            color: self.frame_color,
            stroke: FRAME_STROKE,
        });
        let inset = self.layout.qr_frame_padding;
        elements.push(SurfaceElement::Qr {
            payload: section.payload,
            rect: SurfaceRect::new(
                frame_rect.x + inset,
                frame_rect.y + inset,
                self.layout.qr_size,
                self.layout.qr_size,
            ),
            matrix: section.matrix,
            color: self.qr_color,
        });
        y += frame + self.layout.element_gap;

        let line_height = self.value_line_height();
        for text in section.lines {
            elements.push(SurfaceElement::Text {
                text,
                line: SurfaceRect::new(
                    padding + self.layout.value_inset,
                    y,
                    self.value_width(),
                    line_height,
                ),
                style: self.value_style,
            });
            y += line_height;
        }

        y
    }
}
