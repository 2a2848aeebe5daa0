//! Label rasterizer
//!
//! Paints a [`LabelSurface`] into an RGB bitmap at an integer oversampling
//! factor. Output is a pure function of the surface and the options.

use std::sync::Arc;

use image::{Rgb, RgbImage};

use crate::error::{ExportError, Result};
use crate::label::{LabelSurface, SurfaceElement, SurfaceRect, TextStyle};

use super::text_renderer::FontBook;

/// Largest bitmap edge the rasterizer will allocate
const MAX_EDGE_PX: u32 = 16_384;

/// Rasterization options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    /// Oversampling factor over the logical label size
    pub scale: u32,
    /// Fill colour behind every element
    pub background: [u8; 3],
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: 3,
            background: [255, 255, 255],
        }
    }
}

/// Converts a rendered label into a bitmap
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, surface: &LabelSurface, options: &RasterOptions) -> Result<RgbImage>;
}

/// Software rasterizer backed by fontdue for text
#[derive(Debug, Clone)]
pub struct LabelRasterizer {
    fonts: Arc<FontBook>,
}

impl LabelRasterizer {
    pub fn new(fonts: Arc<FontBook>) -> Self {
        Self { fonts }
    }

    fn draw_text(&self, image: &mut RgbImage, text: &str, line: &SurfaceRect, style: &TextStyle, scale: f32) {
        let px = style.size * scale;
        let spacing = style.letter_spacing * scale;
        let width = self.fonts.measure(text, px, spacing);
        let (ascent, descent) = self.fonts.vertical_metrics(px);

        let left = line.x * scale + (line.width * scale - width) / 2.0;
        let glyph_height = ascent - descent;
        let baseline = line.y * scale + (line.height * scale - glyph_height) / 2.0 + ascent;
        let bold_offset = if style.bold { (scale / 2.0).round().max(1.0) as u32 } else { 0 };

        self.fonts
            .draw_line(image, text, left, baseline, px, spacing, style.color, bold_offset);
    }
}

impl Rasterizer for LabelRasterizer {
    fn rasterize(&self, surface: &LabelSurface, options: &RasterOptions) -> Result<RgbImage> {
        let scale = options.scale;
        let edge = surface
            .size
            .checked_mul(scale)
            .filter(|edge| *edge > 0 && *edge <= MAX_EDGE_PX)
            .ok_or_else(|| {
                ExportError::Raster(format!(
                    "label of {}px at scale {} is out of range",
                    surface.size, scale
                ))
            })?;

        let mut image = RgbImage::from_pixel(edge, edge, Rgb(options.background));
        let s = scale as f32;

        for element in &surface.elements {
            match element {
                SurfaceElement::Text { text, line, style } => {
                    self.draw_text(&mut image, text, line, style, s);
                }
                SurfaceElement::Frame { rect, color, stroke } => {
                    stroke_rect(&mut image, rect, *stroke, *color, s);
                }
                SurfaceElement::Qr { rect, matrix, color, .. } => {
                    let modules = matrix.width();
                    if modules == 0 {
                        continue;
                    }
                    let module = rect.width / modules as f32;
                    for my in 0..modules {
                        for mx in 0..modules {
                            if !matrix.is_dark(mx, my) {
                                continue;
                            }
                            // Edges are rounded per module boundary so neighbours never gap or overlap
                            let x0 = ((rect.x + mx as f32 * module) * s).round() as i64;
                            let x1 = ((rect.x + (mx + 1) as f32 * module) * s).round() as i64;
                            let y0 = ((rect.y + my as f32 * module) * s).round() as i64;
                            let y1 = ((rect.y + (my + 1) as f32 * module) * s).round() as i64;
                            fill_px(&mut image, x0, y0, x1, y1, *color);
                        }
                    }
                }
            }
        }

        Ok(image)
    }
}

/// Fill the half-open pixel range [x0, x1) × [y0, y1), clipped to the image
fn fill_px(image: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 3]) {
    let (w, h) = image.dimensions();
    let x0 = x0.clamp(0, w as i64) as u32;
    let x1 = x1.clamp(0, w as i64) as u32;
    let y0 = y0.clamp(0, h as i64) as u32;
    let y1 = y1.clamp(0, h as i64) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, Rgb(color));
        }
    }
}

/// Outline `rect` with a stroke drawn inside its bounds
fn stroke_rect(image: &mut RgbImage, rect: &SurfaceRect, stroke: f32, color: [u8; 3], s: f32) {
    let x0 = (rect.x * s).round() as i64;
    let y0 = (rect.y * s).round() as i64;
    let x1 = ((rect.x + rect.width) * s).round() as i64;
    let y1 = ((rect.y + rect.height) * s).round() as i64;
    let t = ((stroke * s).round() as i64).max(1);

    fill_px(image, x0, y0, x1, y0 + t, color);
    fill_px(image, x0, y1 - t, x1, y1, color);
    fill_px(image, x0, y0, x0 + t, y1, color);
    fill_px(image, x1 - t, y0, x1, y1, color);
}
