//! Document root and metadata definitions
//!
//! This module defines the top-level rendered document and the metadata
//! every backend needs (title, page orientation, free attributes).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::block::Block;

/// A complete rendered document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, orientation, attributes)
    pub metadata: DocumentMeta,
    /// Document content blocks
    pub blocks: Vec<Block>,
}

/// Page orientation requested by the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Document metadata
///
/// Attributes are kept in a `BTreeMap` so that serializing the same
/// document twice always yields the same bytes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Document title
    pub title: Option<String>,
    /// Page orientation
    pub orientation: Orientation,
    /// Additional attributes (project name, agency, template id)
    pub attributes: BTreeMap<String, String>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            metadata: DocumentMeta::default(),
            blocks: Vec::new(),
        }
    }

    /// Create a document with a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            metadata: DocumentMeta::with_title(title),
            blocks: Vec::new(),
        }
    }

    /// Add a block to the document
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Check if the document is empty (no blocks)
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Title or a fallback for untitled content
    pub fn title_or_default(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or("Untitled")
    }

    /// Iterate over every table in the document
    pub fn tables(&self) -> impl Iterator<Item = &crate::block::Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    /// All visible text, blocks separated by newlines
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentMeta {
    /// Create metadata with just a title
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Get an attribute
    pub fn get_attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Paragraph;

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.len(), 0);
        assert_eq!(doc.title_or_default(), "Untitled");
    }

    #[test]
    fn test_document_with_title() {
        let doc = Document::with_title("Deviation Statement");
        assert_eq!(doc.metadata.title, Some("Deviation Statement".to_string()));
        assert_eq!(doc.metadata.orientation, Orientation::Portrait);
    }

    #[test]
    fn test_document_push_block() {
        let mut doc = Document::new();
        doc.push(Block::Paragraph(Paragraph::text("Hello")));
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.plain_text(), "Hello");
    }

    #[test]
    fn test_metadata_attributes() {
        let mut meta = DocumentMeta::default();
        meta.set_attribute("agency", "M/s Builders");
        assert_eq!(meta.get_attribute("agency"), Some("M/s Builders"));
        assert_eq!(meta.get_attribute("missing"), None);
    }

    #[test]
    fn test_serialization_is_stable() {
        let mut doc = Document::with_title("Summary");
        doc.metadata.set_attribute("b", "2");
        doc.metadata.set_attribute("a", "1");
        let first = serde_json::to_string(&doc).unwrap();
        let second = serde_json::to_string(&doc.clone()).unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"a\"").unwrap() < first.find("\"b\"").unwrap());
    }
}
