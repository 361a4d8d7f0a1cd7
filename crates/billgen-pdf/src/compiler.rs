//! Typst to PDF compiler
//!
//! Compiles Typst markup to PDF bytes using typst-as-lib.

use std::path::Path;

use crate::error::{PdfError, Result};
use typst_as_lib::TypstEngine;

/// Compiler for converting Typst markup to PDF
pub struct Compiler;

impl Compiler {
    /// Compile Typst markup to PDF bytes
    pub fn compile(markup: &str) -> Result<Vec<u8>> {
        Self::compile_with_fonts::<&str>(markup, &[])
    }

    /// Compile with font files loaded from disk
    pub fn compile_with_fonts<P: AsRef<Path>>(markup: &str, font_paths: &[P]) -> Result<Vec<u8>> {
        let mut fonts = Vec::with_capacity(font_paths.len());
        for font_path in font_paths {
            let font_path = font_path.as_ref();
            let font_bytes = std::fs::read(font_path).map_err(|e| {
                PdfError::Font(format!("Failed to read font {}: {}", font_path.display(), e))
            })?;
            fonts.push(font_bytes);
        }

        let engine = TypstEngine::builder()
            .main_file(markup.to_string())
            .fonts(fonts)
            .build();

        // compiled is Warned<Result<Document, Error>>
        let compiled = engine.compile();
        let document = compiled
            .output
            .map_err(|e| PdfError::Compilation(format!("{:?}", e)))?;

        let options = typst_pdf::PdfOptions::default();
        let pdf_bytes = typst_pdf::pdf(&document, &options)
            .map_err(|e| PdfError::Compilation(format!("PDF generation failed: {:?}", e)))?;

        Ok(pdf_bytes.into())
    }
}
