//! Utility helpers

pub mod color;
pub mod time;
