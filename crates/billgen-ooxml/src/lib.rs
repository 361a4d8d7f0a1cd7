//! billgen-ooxml - word-processor output and ZIP packaging
//!
//! - [`DocxWriter`] writes rendered content as a `.docx` package
//! - [`PartArchive`] is the deterministic ZIP container used for DOCX
//!   parts and for the per-dataset output archive
//! - [`DocxBackend`] exposes the writer to the conversion engine as `docx`

pub mod archive;
pub mod error;
pub mod writer;

use billgen_ast::Document;
use billgen_engine::{BackendError, BackendResult, ConversionBackend, MediaKind};

pub use archive::PartArchive;
pub use error::{OoxmlError, Result};
pub use writer::DocxWriter;

/// In-process DOCX backend
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxBackend;

impl DocxBackend {
    pub const NAME: &'static str = "docx";

    pub fn new() -> Self {
        Self
    }
}

impl ConversionBackend for DocxBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn produces(&self, kind: MediaKind) -> bool {
        kind == MediaKind::WordProcessor
    }

    fn convert(&self, content: &Document, kind: MediaKind) -> BackendResult<Vec<u8>> {
        if kind != MediaKind::WordProcessor {
            return Err(BackendError::UnsupportedKind(kind));
        }
        DocxWriter::generate(content).map_err(|e| match e {
            OoxmlError::Io(io) => BackendError::Io(io),
            other => BackendError::Failed(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_produces_word_only() {
        let backend = DocxBackend::new();
        assert_eq!(backend.name(), "docx");
        assert!(backend.produces(MediaKind::WordProcessor));
        assert!(!backend.produces(MediaKind::Markup));
        assert!(matches!(
            backend.convert(&Document::new(), MediaKind::Paginated),
            Err(BackendError::UnsupportedKind(MediaKind::Paginated))
        ));
    }

    #[test]
    fn test_backend_output_passes_structure_check() {
        let bytes = DocxBackend::new()
            .convert(&Document::with_title("Extra Items"), MediaKind::WordProcessor)
            .unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
        assert!(billgen_engine::QualityPolicy::default()
            .check(MediaKind::WordProcessor, &bytes)
            .is_pass());
    }
}
