//! Conversion backend trait and error types
//!
//! This module defines the core abstraction for conversion backends,
//! enabling a pluggable, fallback-based conversion architecture.

use std::time::Duration;

use billgen_ast::Document;

use crate::types::MediaKind;

/// Errors that can occur during a single backend invocation
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend cannot produce this media kind
    #[error("Unsupported media kind: {0}")]
    UnsupportedKind(MediaKind),

    /// The backend is not available (e.g., external program not installed)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Conversion failed during execution
    #[error("Conversion failed: {0}")]
    Failed(String),

    /// The backend returned successfully but produced no bytes
    #[error("Backend produced empty output")]
    EmptyOutput,

    /// The invocation exceeded its time limit
    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),

    /// The backend panicked (caught via catch_unwind)
    #[error("Backend panicked: {0}")]
    Panic(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Trait for conversion backends
///
/// A backend turns rendered content into the byte stream of one media
/// kind. The engine orchestrates several backends per kind with
/// validation and fallback.
///
/// # Thread Safety
///
/// Backends must be `Send + Sync`: one instance is shared by every
/// worker, and each invocation may run on its own timeout-guarded
/// thread.
pub trait ConversionBackend: Send + Sync {
    /// Identifier used in engine order configuration
    fn name(&self) -> &str;

    /// Check if this backend produces the given media kind
    fn produces(&self, kind: MediaKind) -> bool;

    /// Check if the backend is currently usable
    ///
    /// In-process backends always are. Backends wrapping an external
    /// program check that the program can be found.
    fn is_available(&self) -> bool {
        true
    }

    /// Convert rendered content to the given media kind
    fn convert(&self, content: &Document, kind: MediaKind) -> BackendResult<Vec<u8>>;
}
