//! Error types for label rendering and export
//!
//! Messages never carry usernames or passwords.

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised while rendering, rasterizing or assembling labels
#[derive(Error, Debug)]
pub enum ExportError {
    /// Payload could not be encoded, even at the lowest correction level
    #[error("QR encoding failed: {0}")]
    QrEncoding(String),

    /// Font could not be loaded
    #[error("Font error: {0}")]
    Font(String),

    /// Rasterization produced no usable image
    #[error("Rasterization failed: {0}")]
    Raster(String),

    /// Offscreen render worker went away before signalling
    #[error("Label render was aborted")]
    RenderAborted,

    /// Image placed on a document with no page
    #[error("Document has no page to place the image on")]
    NoPage,

    /// PDF structure error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// File system error while saving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
