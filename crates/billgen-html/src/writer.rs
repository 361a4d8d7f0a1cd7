//! Rendered content to HTML
//!
//! Produces a self-contained page: inline stylesheet, no scripts, no
//! external resources. Output is deterministic for a given document.

use quick_xml::escape::escape;

use billgen_ast::{
    Alignment, Block, BreakType, Document, FormatType, Inline, Orientation, Table, TableCell,
    TableRow,
};

const BASE_STYLE: &str = "\
body { font-family: 'Times New Roman', serif; font-size: 11pt; margin: 0; }
h1 { font-size: 15pt; text-align: center; margin: 0 0 6pt 0; }
h2 { font-size: 13pt; margin: 10pt 0 4pt 0; }
h3 { font-size: 11pt; margin: 8pt 0 4pt 0; }
p { margin: 3pt 0; }
table { width: 100%; border-collapse: collapse; margin: 6pt 0; }
th, td { border: 1px solid #000; padding: 2pt 4pt; vertical-align: top; }
th { background: #f0f0f0; }
caption { font-weight: bold; padding: 4pt; }
.left { text-align: left; }
.center { text-align: center; }
.right { text-align: right; }
.page-break { page-break-after: always; break-after: page; }
";

/// Writer turning rendered content into an HTML page
pub struct HtmlWriter;

impl HtmlWriter {
    /// Render a full HTML document
    pub fn write(doc: &Document) -> String {
        let mut out = String::with_capacity(4096);
        let title = doc.title_or_default();

        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape(title)));
        for (key, value) in &doc.metadata.attributes {
            out.push_str(&format!(
                "<meta name=\"{}\" content=\"{}\">\n",
                escape(key.as_str()),
                escape(value.as_str())
            ));
        }
        out.push_str("<style>\n");
        out.push_str(match doc.metadata.orientation {
            Orientation::Portrait => "@page { size: A4 portrait; margin: 12mm; }\n",
            Orientation::Landscape => "@page { size: A4 landscape; margin: 10mm; }\n",
        });
        out.push_str(BASE_STYLE);
        out.push_str("</style>\n</head>\n<body>\n");

        for block in &doc.blocks {
            Self::write_block(&mut out, block);
        }

        out.push_str("</body>\n</html>\n");
        out
    }

    fn write_block(out: &mut String, block: &Block) {
        match block {
            Block::Heading(h) => {
                let level = h.level.clamp(1, 6);
                out.push_str(&format!(
                    "<h{}>{}</h{}>\n",
                    level,
                    Self::inlines(&h.text),
                    level
                ));
            }
            Block::Paragraph(p) => {
                out.push_str("<p");
                push_align_class(out, p.align);
                out.push('>');
                out.push_str(&Self::inlines(&p.inlines));
                out.push_str("</p>\n");
            }
            Block::Table(table) => Self::write_table(out, table),
            Block::Break(BreakType::Page) | Block::Break(BreakType::Section) => {
                out.push_str("<div class=\"page-break\"></div>\n");
            }
        }
    }

    fn write_table(out: &mut String, table: &Table) {
        out.push_str("<table>\n");

        if let Some(caption) = &table.caption {
            out.push_str(&format!("<caption>{}</caption>\n", Self::inlines(caption)));
        }

        let total: u32 = table.columns.iter().filter_map(|c| c.width).sum();
        if total > 0 {
            out.push_str("<colgroup>");
            for column in &table.columns {
                let width = column.width.unwrap_or(0);
                let percent = f64::from(width) * 100.0 / f64::from(total);
                out.push_str(&format!("<col style=\"width: {:.1}%\">", percent));
            }
            out.push_str("</colgroup>\n");
        }

        let (header, body): (Vec<&TableRow>, Vec<&TableRow>) =
            table.rows.iter().partition(|r| r.is_header);

        if !header.is_empty() {
            out.push_str("<thead>\n");
            for row in header {
                Self::write_row(out, row, "th", table);
            }
            out.push_str("</thead>\n");
        }

        out.push_str("<tbody>\n");
        for row in body {
            Self::write_row(out, row, "td", table);
        }
        out.push_str("</tbody>\n</table>\n");
    }

    fn write_row(out: &mut String, row: &TableRow, tag: &str, table: &Table) {
        out.push_str("<tr>");
        let mut column = 0usize;
        for cell in &row.cells {
            let align = cell
                .align
                .or_else(|| table.columns.get(column).and_then(|c| c.align));
            Self::write_cell(out, cell, tag, align);
            column += cell.colspan.max(1) as usize;
        }
        out.push_str("</tr>\n");
    }

    fn write_cell(out: &mut String, cell: &TableCell, tag: &str, align: Option<Alignment>) {
        out.push('<');
        out.push_str(tag);
        if cell.colspan > 1 {
            out.push_str(&format!(" colspan=\"{}\"", cell.colspan));
        }
        push_align_class(out, align);
        out.push('>');
        out.push_str(&Self::inlines(&cell.content));
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    fn inlines(inlines: &[Inline]) -> String {
        inlines.iter().map(Self::inline).collect()
    }

    fn inline(inline: &Inline) -> String {
        match inline {
            Inline::Text(text) => escape(text.as_str()).into_owned(),
            Inline::Format(FormatType::Bold, inner) => {
                format!("<strong>{}</strong>", Self::inline(inner))
            }
            Inline::Format(FormatType::Italic, inner) => format!("<em>{}</em>", Self::inline(inner)),
            Inline::Span(inlines) => Self::inlines(inlines),
            Inline::Break => "<br>".to_string(),
        }
    }
}

fn push_align_class(out: &mut String, align: Option<Alignment>) {
    let class = match align {
        Some(Alignment::Left) => "left",
        Some(Alignment::Center) => "center",
        Some(Alignment::Right) => "right",
        None => return,
    };
    out.push_str(&format!(" class=\"{}\"", class));
}

#[cfg(test)]
mod tests {
    use super::*;
    use billgen_ast::{ColumnSpec, Heading, Paragraph};

    fn sample() -> Document {
        let mut doc = Document::with_title("Summary");
        doc.push(Block::Heading(Heading::new(1, "Abstract of Cost")));
        doc.push(Block::Paragraph(
            Paragraph::text("Agency: M/s Verma & Sons").aligned(Alignment::Center),
        ));
        doc.push(Block::Table(Table {
            rows: vec![
                TableRow::header(&["Item", "Description", "Amount"]),
                TableRow::body(vec![
                    TableCell::text("1"),
                    TableCell::text("Earth <work>"),
                    TableCell::number("1500.00"),
                ]),
                TableRow::body(vec![
                    TableCell::text("2"),
                    TableCell::text("Sub-head"),
                    TableCell::empty(),
                ]),
            ],
            caption: None,
            columns: vec![
                ColumnSpec { width: Some(1), align: None },
                ColumnSpec { width: Some(3), align: None },
                ColumnSpec { width: Some(1), align: Some(Alignment::Right) },
            ],
        }));
        doc
    }

    #[test]
    fn test_document_skeleton() {
        let html = HtmlWriter::write(&sample());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Summary</title>"));
        assert!(html.contains("<h1>Abstract of Cost</h1>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = HtmlWriter::write(&sample());
        assert!(html.contains("M/s Verma &amp; Sons"));
        assert!(html.contains("Earth &lt;work&gt;"));
    }

    #[test]
    fn test_table_structure() {
        let html = HtmlWriter::write(&sample());
        assert!(html.contains("<thead>\n<tr><th>Item</th><th>Description</th><th class=\"right\">Amount</th></tr>"));
        assert!(html.contains("<td class=\"right\">1500.00</td>"));
        // suppressed cell stays empty
        assert!(html.contains("<td>Sub-head</td><td class=\"right\"></td>"));
        assert!(html.contains("<col style=\"width: 60.0%\">"));
    }

    #[test]
    fn test_landscape_page_rule() {
        let mut doc = sample();
        doc.metadata.orientation = Orientation::Landscape;
        assert!(HtmlWriter::write(&doc).contains("size: A4 landscape"));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(HtmlWriter::write(&sample()), HtmlWriter::write(&sample()));
    }
}
