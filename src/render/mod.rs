//! Render module
//!
//! Font handling and the bitmap rasterizer for label surfaces.

mod rasterizer;
pub mod text_renderer;

pub use rasterizer::{LabelRasterizer, RasterOptions, Rasterizer};
pub use text_renderer::FontBook;
