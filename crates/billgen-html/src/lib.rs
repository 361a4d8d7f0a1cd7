//! billgen-html - markup output
//!
//! [`HtmlWriter`] renders a `billgen_ast::Document` to a standalone HTML
//! page; [`HtmlBackend`] exposes it to the conversion engine as the
//! `html` backend for the markup media kind.

mod writer;

use billgen_ast::Document;
use billgen_engine::{BackendError, BackendResult, ConversionBackend, MediaKind};

pub use writer::HtmlWriter;

/// Convenience function to render a document to HTML
pub fn render_html(doc: &Document) -> String {
    HtmlWriter::write(doc)
}

/// In-process HTML backend
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlBackend;

impl HtmlBackend {
    pub const NAME: &'static str = "html";

    pub fn new() -> Self {
        Self
    }
}

impl ConversionBackend for HtmlBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn produces(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Markup
    }

    fn convert(&self, content: &Document, kind: MediaKind) -> BackendResult<Vec<u8>> {
        if kind != MediaKind::Markup {
            return Err(BackendError::UnsupportedKind(kind));
        }
        Ok(HtmlWriter::write(content).into_bytes())
    }
}
