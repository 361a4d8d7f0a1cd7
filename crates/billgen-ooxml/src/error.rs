//! Error types for OOXML and archive operations

use thiserror::Error;

/// Errors that can occur while building packages
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Required part not found in archive
    #[error("Required file not found: {0}")]
    MissingFile(String),

    /// Part path that cannot be stored in a package
    #[error("Invalid part path: {0}")]
    InvalidPath(String),
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
