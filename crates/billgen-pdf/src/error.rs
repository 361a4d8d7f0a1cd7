//! Error types for PDF generation

use thiserror::Error;

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Errors that can occur during PDF generation
#[derive(Error, Debug)]
pub enum PdfError {
    /// Typst compilation error
    #[error("Typst compilation failed: {0}")]
    Compilation(String),

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// External converter failed or could not be started
    #[error("Converter command failed: {0}")]
    Command(String),

    /// External converter exceeded its deadline
    #[error("Converter command timed out after {0} seconds")]
    CommandTimeout(u64),

    /// Structural error from lopdf
    #[error("PDF structure error: {0}")]
    Lopdf(#[from] lopdf::Error),

    /// Merge input had no pages or no usable page tree
    #[error("Merge failed: {0}")]
    Merge(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
