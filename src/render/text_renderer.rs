//! Text renderer
//!
//! Uses fontdue to measure and rasterize single lines of text straight into
//! an RGB image. Faux bold is produced by rendering the line again with a
//! small x-offset, max-blending the coverage.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings, Metrics};
use image::{Rgb, RgbImage};
use parking_lot::Mutex;
use tracing::info;

use crate::error::{ExportError, Result};
use crate::utils::color::blend_colors;

/// Rasterized glyph: metrics plus coverage bitmap
type Glyph = Arc<(Metrics, Vec<u8>)>;

/// Loaded font face with a glyph cache shared between threads
pub struct FontBook {
    font: Font,
    /// Keyed by character and the bit pattern of the pixel size
    glyphs: Mutex<HashMap<(char, u32), Glyph>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("cached_glyphs", &self.glyphs.lock().len())
            .finish()
    }
}

impl FontBook {
    /// Load the face at `path`, or the embedded Ubuntu-Light face
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let bytes = std::fs::read(path)?;
                info!("Loaded font: {}", path.display());
                Self::from_bytes(&bytes)
            }
            None => Self::from_bytes(epaint_default_fonts::UBUNTU_LIGHT),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| ExportError::Font(e.to_string()))?;
        Ok(Self {
            font,
            glyphs: Mutex::new(HashMap::new()),
        })
    }

    /// Embedded face. Used by tests and as the fallback when a custom font fails.
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    fn glyph(&self, ch: char, px: f32) -> Glyph {
        let key = (ch, px.to_bits());
        if let Some(glyph) = self.glyphs.lock().get(&key) {
            return glyph.clone();
        }
        // Rasterize outside the lock; a racing thread produces the same bitmap
        let glyph = Arc::new(self.font.rasterize(ch, px));
        self.glyphs.lock().entry(key).or_insert(glyph).clone()
    }

    /// Advance width of `text` at `px`, including letter spacing between glyphs
    pub fn measure(&self, text: &str, px: f32, letter_spacing: f32) -> f32 {
        let mut width = 0.0;
        let mut count = 0usize;
        for ch in text.chars() {
            width += self.font.metrics(ch, px).advance_width;
            count += 1;
        }
        if count > 1 {
            width += letter_spacing * (count - 1) as f32;
        }
        width
    }

    /// Ascent and descent (negative) at `px`
    pub fn vertical_metrics(&self, px: f32) -> (f32, f32) {
        match self.font.horizontal_line_metrics(px) {
            Some(line) => (line.ascent, line.descent),
            None => (px * 0.8, -px * 0.2),
        }
    }

    /// Draw one line of text with its baseline at `baseline` and left edge at `left`.
    ///
    /// `bold_offset` > 0 renders the line again shifted right by that many pixels.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &self,
        image: &mut RgbImage,
        text: &str,
        left: f32,
        baseline: f32,
        px: f32,
        letter_spacing: f32,
        color: [u8; 3],
        bold_offset: u32,
    ) {
        let (img_w, img_h) = image.dimensions();
        if img_w == 0 || img_h == 0 {
            return;
        }

        // Coverage of the whole line, blended once so overlapping glyphs do not darken twice
        let mut coverage: HashMap<(u32, u32), u8> = HashMap::new();
        let baseline = baseline.round() as i32;
        let mut cursor = left;

        for ch in text.chars() {
            let glyph = self.glyph(ch, px);
            let (metrics, bitmap) = (&glyph.0, &glyph.1);
            let glyph_x = cursor.round() as i32 + metrics.xmin;
            let glyph_y = baseline - metrics.height as i32 - metrics.ymin;

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let alpha = bitmap[gy * metrics.width + gx];
                    if alpha == 0 {
                        continue;
                    }
                    for dx in 0..=bold_offset as i32 {
                        let px_x = glyph_x + gx as i32 + dx;
                        let px_y = glyph_y + gy as i32;
                        if px_x < 0 || px_y < 0 || px_x >= img_w as i32 || px_y >= img_h as i32 {
                            continue;
                        }
                        let slot = coverage.entry((px_x as u32, px_y as u32)).or_insert(0);
                        *slot = (*slot).max(alpha);
                    }
                }
            }
            cursor += metrics.advance_width + letter_spacing;
        }

        let fg = (color[0], color[1], color[2]);
        for ((x, y), alpha) in coverage {
            let bg = image.get_pixel(x, y).0;
            let (r, g, b) = blend_colors((bg[0], bg[1], bg[2]), fg, alpha as f32 / 255.0);
            image.put_pixel(x, y, Rgb([r, g, b]));
        }
    }
}
