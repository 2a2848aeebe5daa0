//! Configuration module
//!
//! Contains the LabelConfig data structures.

mod label_config;

pub use label_config::*;
