//! Block-level elements for document structure
//!
//! Billing documents are mostly headings, short paragraphs and wide
//! tables, so only those block kinds (plus page breaks) exist here.

use serde::{Deserialize, Serialize};

use crate::inline::{FormatType, Inline};

/// Block-level content element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    /// A paragraph of text
    Paragraph(Paragraph),
    /// A section heading
    Heading(Heading),
    /// A table
    Table(Table),
    /// A page or section break
    Break(BreakType),
}

/// A paragraph block
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Inline content within the paragraph
    pub inlines: Vec<Inline>,
    /// Paragraph alignment
    pub align: Option<Alignment>,
}

/// A section heading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading level (1-6, where 1 is the highest)
    pub level: u8,
    /// Heading text content
    pub text: Vec<Inline>,
}

/// A table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    /// Table rows
    pub rows: Vec<TableRow>,
    /// Table caption
    pub caption: Option<Vec<Inline>>,
    /// Column specifications
    pub columns: Vec<ColumnSpec>,
}

/// A table row
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in this row
    pub cells: Vec<TableCell>,
    /// Whether this is a header row
    pub is_header: bool,
}

/// A table cell
///
/// A cell with no content is rendered empty by every backend; the
/// renderer relies on that for suppressed amount columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content (inlines)
    pub content: Vec<Inline>,
    /// Column span
    pub colspan: u32,
    /// Horizontal alignment
    pub align: Option<Alignment>,
}

/// Column specification
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Relative width (e.g., 1, 2, 3 for proportional sizing)
    pub width: Option<u32>,
    /// Default alignment for this column
    pub align: Option<Alignment>,
}

/// Text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// Break type variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakType {
    /// Page break
    Page,
    /// Section break
    Section,
}

impl Block {
    /// Visible text of this block
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph(p) => Inline::plain_text_of(&p.inlines),
            Block::Heading(h) => Inline::plain_text_of(&h.text),
            Block::Table(t) => t
                .rows
                .iter()
                .map(|r| {
                    r.cells
                        .iter()
                        .map(TableCell::plain_text)
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Break(_) => String::new(),
        }
    }
}

impl Paragraph {
    /// Paragraph holding a single text run
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            inlines: vec![Inline::Text(text.into())],
            align: None,
        }
    }

    /// Paragraph holding a single bold run
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            inlines: vec![Inline::Format(
                FormatType::Bold,
                Box::new(Inline::Text(text.into())),
            )],
            align: None,
        }
    }

    /// Set alignment
    pub fn aligned(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }
}

impl Heading {
    /// Create a heading with plain text
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: vec![Inline::Text(text.into())],
        }
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self {
            level: 1,
            text: Vec::new(),
        }
    }
}

impl Table {
    /// Number of columns, from the column specs or the widest row
    pub fn column_count(&self) -> usize {
        let widest = self
            .rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.colspan.max(1) as usize).sum())
            .max()
            .unwrap_or(0);
        self.columns.len().max(widest)
    }

    /// Rows that are not header rows
    pub fn body_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.rows.iter().filter(|r| !r.is_header)
    }
}

impl TableRow {
    /// Header row from labels
    pub fn header<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            cells: labels.iter().map(|l| TableCell::text(l.as_ref())).collect(),
            is_header: true,
        }
    }

    /// Body row from cells
    pub fn body(cells: Vec<TableCell>) -> Self {
        Self {
            cells,
            is_header: false,
        }
    }
}

impl TableCell {
    /// Cell with no content
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            colspan: 1,
            align: None,
        }
    }

    /// Cell holding plain text; an empty string yields an empty cell
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::empty();
        }
        Self {
            content: vec![Inline::Text(text)],
            colspan: 1,
            align: None,
        }
    }

    /// Right-aligned numeric cell
    pub fn number(text: impl Into<String>) -> Self {
        Self::text(text).aligned(Alignment::Right)
    }

    /// Cell with bold text
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            content: vec![Inline::Format(
                FormatType::Bold,
                Box::new(Inline::Text(text.into())),
            )],
            colspan: 1,
            align: None,
        }
    }

    /// Set alignment
    pub fn aligned(mut self, align: Alignment) -> Self {
        self.align = Some(align);
        self
    }

    /// Set column span
    pub fn spanning(mut self, colspan: u32) -> Self {
        self.colspan = colspan.max(1);
        self
    }

    /// Whether the cell renders nothing
    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Visible text of the cell
    pub fn plain_text(&self) -> String {
        Inline::plain_text_of(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_default() {
        let para = Paragraph::default();
        assert!(para.inlines.is_empty());
        assert!(para.align.is_none());
    }

    #[test]
    fn test_empty_text_cell_is_empty() {
        assert!(TableCell::text("").is_empty());
        assert!(TableCell::empty().content.is_empty());
        assert!(!TableCell::number("12.50").is_empty());
    }

    #[test]
    fn test_column_count_uses_spans() {
        let table = Table {
            rows: vec![
                TableRow::header(&["A", "B", "C"]),
                TableRow::body(vec![TableCell::text("Total").spanning(2), TableCell::text("9")]),
            ],
            ..Default::default()
        };
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.body_rows().count(), 1);
    }

    #[test]
    fn test_table_plain_text() {
        let block = Block::Table(Table {
            rows: vec![TableRow::body(vec![
                TableCell::text("1.1"),
                TableCell::bold("Earthwork"),
            ])],
            ..Default::default()
        });
        assert_eq!(block.plain_text(), "1.1\tEarthwork");
    }
}
