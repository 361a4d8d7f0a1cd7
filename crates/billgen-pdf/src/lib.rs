//! billgen-pdf - paginated output
//!
//! Three interchangeable ways to turn rendered content into a PDF, plus
//! merging of finished PDFs.
//!
//! # Backends
//!
//! | id        | how                                                  |
//! |-----------|------------------------------------------------------|
//! | `typst`   | [`Transpiler`] to Typst markup, [`Compiler`] to PDF  |
//! | `command` | HTML handed to an external program ([`ConverterCommand`]) |
//! | `simple`  | direct lopdf layout ([`SimplePdfWriter`])            |
//!
//! # Example
//!
//! ```ignore
//! use billgen_ast::Document;
//! use billgen_pdf::{Transpiler, Compiler};
//!
//! let doc = Document::new();
//! let typst_markup = Transpiler::transpile(&doc);
//! let pdf_bytes = Compiler::compile(&typst_markup)?;
//! ```

mod command;
mod compiler;
mod error;
mod merge;
mod simple;
mod transpiler;

use std::path::PathBuf;

use billgen_ast::Document;
use billgen_engine::{BackendError, BackendResult, ConversionBackend, MediaKind};

pub use command::ConverterCommand;
pub use compiler::Compiler;
pub use error::{PdfError, Result};
pub use merge::merge_pdfs;
pub use simple::SimplePdfWriter;
pub use transpiler::Transpiler;

/// Convenience function to render a document to PDF via Typst
pub fn render_pdf(doc: &Document) -> Result<Vec<u8>> {
    let typst_markup = Transpiler::transpile(doc);
    Compiler::compile(&typst_markup)
}

fn to_backend_error(err: PdfError) -> BackendError {
    match err {
        PdfError::CommandTimeout(secs) => {
            BackendError::Timeout(std::time::Duration::from_secs(secs))
        }
        PdfError::Io(e) => BackendError::Io(e),
        other => BackendError::Failed(other.to_string()),
    }
}

fn ensure_paginated(kind: MediaKind) -> BackendResult<()> {
    if kind == MediaKind::Paginated {
        Ok(())
    } else {
        Err(BackendError::UnsupportedKind(kind))
    }
}

/// Typst typesetting backend
#[derive(Debug, Clone, Default)]
pub struct TypstBackend {
    fonts: Vec<PathBuf>,
}

impl TypstBackend {
    pub const NAME: &'static str = "typst";

    pub fn new() -> Self {
        Self::default()
    }

    /// Load these font files into every compilation
    pub fn with_fonts(fonts: Vec<PathBuf>) -> Self {
        Self { fonts }
    }
}

impl ConversionBackend for TypstBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn produces(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Paginated
    }

    fn convert(&self, content: &Document, kind: MediaKind) -> BackendResult<Vec<u8>> {
        ensure_paginated(kind)?;
        let markup = Transpiler::transpile(content);
        Compiler::compile_with_fonts(&markup, &self.fonts).map_err(to_backend_error)
    }
}

/// External converter backend
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: ConverterCommand,
}

impl CommandBackend {
    pub const NAME: &'static str = "command";

    pub fn new(command: ConverterCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &ConverterCommand {
        &self.command
    }
}

impl ConversionBackend for CommandBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn produces(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Paginated
    }

    fn is_available(&self) -> bool {
        self.command.locate().is_some()
    }

    fn convert(&self, content: &Document, kind: MediaKind) -> BackendResult<Vec<u8>> {
        ensure_paginated(kind)?;
        self.command.run(content).map_err(to_backend_error)
    }
}

/// Built-in lopdf layout backend
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePdfBackend;

impl SimplePdfBackend {
    pub const NAME: &'static str = "simple";

    pub fn new() -> Self {
        Self
    }
}

impl ConversionBackend for SimplePdfBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn produces(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Paginated
    }

    fn convert(&self, content: &Document, kind: MediaKind) -> BackendResult<Vec<u8>> {
        ensure_paginated(kind)?;
        SimplePdfWriter::write(content).map_err(to_backend_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names() {
        assert_eq!(TypstBackend::new().name(), "typst");
        assert_eq!(SimplePdfBackend::new().name(), "simple");
        assert_eq!(
            CommandBackend::new(ConverterCommand::new("wkhtmltopdf")).name(),
            "command"
        );
    }

    #[test]
    fn test_backends_produce_paginated_only() {
        let simple = SimplePdfBackend::new();
        assert!(simple.produces(MediaKind::Paginated));
        assert!(!simple.produces(MediaKind::Markup));
        assert!(matches!(
            simple.convert(&Document::new(), MediaKind::WordProcessor),
            Err(BackendError::UnsupportedKind(MediaKind::WordProcessor))
        ));
    }

    #[test]
    fn test_simple_backend_output() {
        let bytes = SimplePdfBackend::new()
            .convert(&Document::with_title("Summary"), MediaKind::Paginated)
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_command_backend_unavailable_without_program() {
        let backend = CommandBackend::new(ConverterCommand::new("billgen-missing-converter"));
        assert!(!backend.is_available());
    }

    #[test]
    fn test_timeout_maps_to_backend_timeout() {
        let err = to_backend_error(PdfError::CommandTimeout(3));
        assert!(matches!(err, BackendError::Timeout(d) if d.as_secs() == 3));
    }
}
