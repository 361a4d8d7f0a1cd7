//! billgen-ast - rendered content tree
//!
//! Format-agnostic representation of a logical billing document after a
//! template has been applied. The content renderer produces it, the
//! conversion backends (markup, paginated, word-processor) consume it.

pub mod block;
pub mod document;
pub mod inline;

pub use block::{
    Alignment, Block, BreakType, ColumnSpec, Heading, Paragraph, Table, TableCell, TableRow,
};
pub use document::{Document, DocumentMeta, Orientation};
pub use inline::{FormatType, Inline};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
