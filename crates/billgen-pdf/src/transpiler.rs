//! AST to Typst markup transpiler
//!
//! Converts rendered billing content to Typst markup strings.

use billgen_ast::{
    Alignment, Block, BreakType, Document, FormatType, Inline, Orientation, Table, TableCell,
    TableRow,
};

/// Transpiler for converting AST to Typst markup
pub struct Transpiler;

impl Transpiler {
    /// Transpile a document to Typst markup
    pub fn transpile(doc: &Document) -> String {
        let mut output = String::new();

        if let Some(ref title) = doc.metadata.title {
            output.push_str(&format!(
                "#set document(title: \"{}\")\n",
                escape_string(title)
            ));
        }

        let flipped = matches!(doc.metadata.orientation, Orientation::Landscape);
        output.push_str(&format!(
            "#set page(paper: \"a4\", flipped: {}, margin: (x: 12mm, y: 14mm))\n",
            flipped
        ));
        output.push_str("#set text(size: 9pt)\n");
        output.push_str("#set par(justify: false)\n\n");

        for block in &doc.blocks {
            output.push_str(&Self::transpile_block(block));
            output.push('\n');
        }

        output
    }

    /// Transpile a single block
    fn transpile_block(block: &Block) -> String {
        match block {
            Block::Heading(h) => {
                let text = Self::transpile_inlines(&h.text);
                if h.level <= 1 {
                    format!("#align(center)[#text(size: 13pt, weight: \"bold\")[{}]]\n", text)
                } else {
                    format!("{} {}\n", "=".repeat(h.level as usize - 1), text)
                }
            }

            Block::Paragraph(p) => {
                let text = Self::transpile_inlines(&p.inlines);
                match p.align {
                    Some(align) => format!("#align({})[{}]\n", align_name(align), text),
                    None => format!("{}\n", text),
                }
            }

            Block::Table(table) => Self::transpile_table(table),

            Block::Break(BreakType::Page) | Block::Break(BreakType::Section) => {
                "#pagebreak(weak: true)\n".to_string()
            }
        }
    }

    /// Transpile a table
    fn transpile_table(table: &Table) -> String {
        let mut output = String::new();
        let col_count = table.column_count().max(1);

        let columns: Vec<String> = if table.columns.iter().any(|c| c.width.is_some()) {
            (0..col_count)
                .map(|i| {
                    let width = table.columns.get(i).and_then(|c| c.width).unwrap_or(1);
                    format!("{}fr", width.max(1))
                })
                .collect()
        } else {
            vec!["1fr".to_string(); col_count]
        };

        let aligns: Vec<&str> = (0..col_count)
            .map(|i| {
                table
                    .columns
                    .get(i)
                    .and_then(|c| c.align)
                    .map(align_name)
                    .unwrap_or("left")
            })
            .collect();

        if let Some(caption) = &table.caption {
            output.push_str(&format!(
                "#align(center)[*{}*]\n",
                Self::transpile_inlines(caption)
            ));
        }

        output.push_str("#table(\n");
        output.push_str(&format!("  columns: ({},),\n", columns.join(", ")));
        output.push_str(&format!("  align: ({},),\n", aligns.join(", ")));
        output.push_str("  inset: 4pt,\n");

        let header: Vec<&TableRow> = table.rows.iter().filter(|r| r.is_header).collect();
        if !header.is_empty() {
            output.push_str("  table.header(\n");
            for row in header {
                output.push_str(&Self::transpile_table_row(row, "    "));
            }
            output.push_str("  ),\n");
        }

        for row in table.body_rows() {
            output.push_str(&Self::transpile_table_row(row, "  "));
        }

        output.push_str(")\n");
        output
    }

    /// Transpile a table row
    fn transpile_table_row(row: &TableRow, indent: &str) -> String {
        let mut output = String::new();
        for cell in &row.cells {
            output.push_str(indent);
            output.push_str(&Self::transpile_cell(cell, row.is_header));
            output.push_str(",\n");
        }
        output
    }

    fn transpile_cell(cell: &TableCell, header: bool) -> String {
        let mut content = Self::transpile_inlines(&cell.content);
        if header && !content.is_empty() {
            content = format!("*{}*", content);
        }

        let mut args = Vec::new();
        if cell.colspan > 1 {
            args.push(format!("colspan: {}", cell.colspan));
        }
        if let Some(align) = cell.align {
            args.push(format!("align: {}", align_name(align)));
        }

        if args.is_empty() {
            format!("[{}]", content)
        } else {
            format!("table.cell({})[{}]", args.join(", "), content)
        }
    }

    /// Transpile inline elements
    fn transpile_inlines(inlines: &[Inline]) -> String {
        inlines.iter().map(Self::transpile_inline).collect()
    }

    /// Transpile a single inline element
    fn transpile_inline(inline: &Inline) -> String {
        match inline {
            Inline::Text(text) => escape_markup(text),
            Inline::Format(format_type, content) => {
                let inner = Self::transpile_inline(content);
                match format_type {
                    FormatType::Bold => format!("*{}*", inner),
                    FormatType::Italic => format!("_{}_", inner),
                }
            }
            Inline::Span(inlines) => Self::transpile_inlines(inlines),
            Inline::Break => " \\\n".to_string(),
        }
    }
}

fn align_name(align: Alignment) -> &'static str {
    match align {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

/// Escape special characters in strings for Typst
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('#', "\\#")
}

/// Escape text placed in markup mode
fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(
            c,
            '\\' | '#' | '*' | '_' | '$' | '@' | '<' | '>' | '[' | ']' | '`' | '~' | '/' | '='
                | '-' | '+' | '"' | '\''
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
