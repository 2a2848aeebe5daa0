//! Label module
//!
//! Turns a username/password pair into a resolution-independent label
//! surface holding two captioned QR codes.

pub mod caption;
pub mod qr;
mod renderer;
mod surface;

pub use renderer::LabelRenderer;
pub use surface::{LabelSurface, SurfaceElement, SurfaceRect, TextStyle};
