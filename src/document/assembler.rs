//! Document assembler seam
//!
//! The export sequencer only talks to these traits, so page order and
//! sizes can be observed without writing files.

use std::path::Path;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Millimetres to PDF points
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page size in millimetres, already oriented
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageFormat {
    /// Build a format; the longer edge is vertical in portrait, horizontal in landscape
    pub fn new(width_mm: f32, height_mm: f32, orientation: Orientation) -> Self {
        let (short, long) = if width_mm <= height_mm {
            (width_mm, height_mm)
        } else {
            (height_mm, width_mm)
        };
        match orientation {
            Orientation::Portrait => Self { width_mm: short, height_mm: long },
            Orientation::Landscape => Self { width_mm: long, height_mm: short },
        }
    }

    /// The 100mm × 100mm label page
    #[cfg(test)]
    pub fn label_square() -> Self {
        Self::new(100.0, 100.0, Orientation::Portrait)
    }

    /// Rectangle covering the whole page with no margin
    pub fn full_bleed(&self) -> PageRect {
        PageRect {
            x_mm: 0.0,
            y_mm: 0.0,
            width_mm: self.width_mm,
            height_mm: self.height_mm,
        }
    }

    pub fn width_pt(&self) -> f32 {
        self.width_mm * MM_TO_PT
    }

    pub fn height_pt(&self) -> f32 {
        self.height_mm * MM_TO_PT
    }

    /// Short "WxH" tag in whole centimetres, e.g. "10x10"
    pub fn cm_tag(&self) -> String {
        format!(
            "{}x{}",
            (self.width_mm / 10.0).round() as i64,
            (self.height_mm / 10.0).round() as i64
        )
    }
}

/// Image placement in millimetres, origin at the top-left corner of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// Multi-page document under construction.
///
/// A new document starts with one page; images go onto the last page.
pub trait DocumentAssembler: Send {
    fn page_count(&self) -> usize;

    /// Append a blank page and make it current
    fn add_page(&mut self, format: PageFormat);

    /// Place an image on the current page
    fn add_image(&mut self, image: &RgbImage, rect: PageRect) -> Result<()>;

    /// Serialize the document to `path`
    fn save(self: Box<Self>, path: &Path) -> Result<()>;
}

/// Creates documents
pub trait DocumentBackend: Send + Sync {
    fn new_document(&self, format: PageFormat) -> Box<dyn DocumentAssembler>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation() {
        let portrait = PageFormat::new(150.0, 100.0, Orientation::Portrait);
        assert_eq!((portrait.width_mm, portrait.height_mm), (100.0, 150.0));
        let landscape = PageFormat::new(100.0, 150.0, Orientation::Landscape);
        assert_eq!((landscape.width_mm, landscape.height_mm), (150.0, 100.0));
        let square = PageFormat::label_square();
        assert_eq!((square.width_mm, square.height_mm), (100.0, 100.0));
    }

    #[test]
    fn test_points() {
        let square = PageFormat::label_square();
        assert!((square.width_pt() - 283.4646).abs() < 0.01);
        assert!((square.height_pt() - 283.4646).abs() < 0.01);
    }

    #[test]
    fn test_full_bleed() {
        let rect = PageFormat::label_square().full_bleed();
        assert_eq!(rect, PageRect { x_mm: 0.0, y_mm: 0.0, width_mm: 100.0, height_mm: 100.0 });
    }

    #[test]
    fn test_cm_tag() {
        assert_eq!(PageFormat::label_square().cm_tag(), "10x10");
        assert_eq!(PageFormat::new(58.0, 40.0, Orientation::Landscape).cm_tag(), "6x4");
    }
}
