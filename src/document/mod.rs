//! Document module
//!
//! Fixed-size page documents assembled from raster images, saved as PDF.

pub mod assembler;
mod pdf;

pub use assembler::{DocumentAssembler, DocumentBackend, Orientation, PageFormat};
pub use pdf::PdfBackend;
