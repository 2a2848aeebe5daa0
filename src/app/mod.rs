//! Application module
//!
//! Contains the egui application and its state container.

mod label_app;
pub mod state;

pub use label_app::LabelApp;
