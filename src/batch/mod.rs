//! Batch queue module
//!
//! Holds the labels waiting for a batch export.

mod queue;

pub use queue::{BatchEntry, BatchQueue, CredentialLabel};
