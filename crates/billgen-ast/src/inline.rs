//! Inline elements for document content

use serde::{Deserialize, Serialize};

/// Inline-level content element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    /// Plain text content
    Text(String),
    /// Formatted content (bold, italic)
    Format(FormatType, Box<Inline>),
    /// A span containing multiple inline elements
    Span(Vec<Inline>),
    /// A line break
    Break,
}

/// Text formatting types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatType {
    /// Bold text
    Bold,
    /// Italic text
    Italic,
}

impl Inline {
    /// Visible text of this inline
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text(text) => text.clone(),
            Inline::Format(_, inner) => inner.plain_text(),
            Inline::Span(inlines) => Self::plain_text_of(inlines),
            Inline::Break => "\n".to_string(),
        }
    }

    /// Concatenated text of a run of inlines
    pub fn plain_text_of(inlines: &[Inline]) -> String {
        inlines.iter().map(Inline::plain_text).collect()
    }
}
