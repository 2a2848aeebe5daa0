//! Export module
//!
//! Turns the form values or the whole batch queue into a finished PDF.

pub mod filename;
mod offscreen;
mod sequencer;

pub use sequencer::{ExportOutcome, ExportSequencer, ExportSettings};
