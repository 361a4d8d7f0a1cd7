//! DOCX Writer
//!
//! Writes a `billgen_ast::Document` as a self-contained WordprocessingML
//! package. No template is needed: the package carries its own minimal
//! style sheet (Normal, Title, Heading1, Heading2, TableGrid).
//!
//! # Example
//!
//! ```ignore
//! use billgen_ast::Document;
//! use billgen_ooxml::DocxWriter;
//!
//! let doc = Document::with_title("Summary");
//! let bytes = DocxWriter::generate(&doc)?;
//! std::fs::write("Summary.docx", bytes)?;
//! ```

use billgen_ast::{
    Alignment, Block, BreakType, Document, FormatType, Heading, Inline, Orientation, Paragraph,
    Table,
};

use crate::archive::PartArchive;
use crate::error::Result;

/// A4 in twentieths of a point
const PAGE_SHORT_EDGE: u32 = 11906;
const PAGE_LONG_EDGE: u32 = 16838;
/// 2 cm
const PAGE_MARGIN: u32 = 1134;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:docDefaults>
<w:rPrDefault><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial" w:cs="Arial"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr></w:rPrDefault>
<w:pPrDefault><w:pPr><w:spacing w:after="60" w:line="240" w:lineRule="auto"/></w:pPr></w:pPrDefault>
</w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
<w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:jc w:val="center"/><w:spacing w:after="120"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="120" w:after="60"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr></w:style>
<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="120" w:after="60"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:style>
<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:left w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:right w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="000000"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="000000"/></w:tblBorders><w:tblCellMar><w:left w:w="57" w:type="dxa"/><w:right w:w="57" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>
</w:styles>"#;

/// Run formatting accumulated while descending nested inlines
#[derive(Debug, Clone, Copy, Default)]
struct RunFormat {
    bold: bool,
    italic: bool,
}

impl RunFormat {
    fn with(self, format: FormatType) -> Self {
        match format {
            FormatType::Bold => Self { bold: true, ..self },
            FormatType::Italic => Self {
                italic: true,
                ..self
            },
        }
    }
}

/// DOCX Writer for generating DOCX files from AST
pub struct DocxWriter {
    /// XML output buffer for word/document.xml
    output: String,
    orientation: Orientation,
}

impl DocxWriter {
    fn new(orientation: Orientation) -> Self {
        Self {
            output: String::new(),
            orientation,
        }
    }

    /// Generate a complete DOCX package
    pub fn generate(doc: &Document) -> Result<Vec<u8>> {
        let mut archive = PartArchive::new();
        archive.set_string("[Content_Types].xml", CONTENT_TYPES_XML)?;
        archive.set_string("_rels/.rels", PACKAGE_RELS_XML)?;
        archive.set_string("word/_rels/document.xml.rels", DOCUMENT_RELS_XML)?;
        archive.set_string("word/styles.xml", STYLES_XML)?;
        archive.set_string("word/document.xml", Self::document_xml(doc))?;
        archive.set_string("docProps/core.xml", core_properties(doc))?;
        archive.to_bytes()
    }

    /// Generate only the main document part
    pub fn document_xml(doc: &Document) -> String {
        let mut writer = Self::new(doc.metadata.orientation);
        writer.generate_document(doc);
        writer.output
    }

    /// Page width minus margins
    fn usable_width(&self) -> u32 {
        let page_width = match self.orientation {
            Orientation::Portrait => PAGE_SHORT_EDGE,
            Orientation::Landscape => PAGE_LONG_EDGE,
        };
        page_width - 2 * PAGE_MARGIN
    }

    fn generate_document(&mut self, doc: &Document) {
        self.output
            .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
        self.output.push_str(
            "<w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\n",
        );
        self.output.push_str("<w:body>\n");

        for block in &doc.blocks {
            self.generate_block(block);
        }

        self.generate_section_properties();
        self.output.push_str("</w:body>\n");
        self.output.push_str("</w:document>\n");
    }

    fn generate_block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(para) => self.generate_paragraph(para),
            Block::Heading(heading) => self.generate_heading(heading),
            Block::Table(table) => self.generate_table(table),
            Block::Break(break_type) => self.generate_break(break_type),
        }
    }

    fn generate_paragraph(&mut self, para: &Paragraph) {
        self.output.push_str("<w:p>\n");
        if let Some(align) = para.align {
            self.output.push_str("<w:pPr>\n");
            self.push_justification(align);
            self.output.push_str("</w:pPr>\n");
        }
        for inline in &para.inlines {
            self.generate_inline(inline, RunFormat::default());
        }
        self.output.push_str("</w:p>\n");
    }

    fn generate_heading(&mut self, heading: &Heading) {
        // Level 1 is the document title
        let style = match heading.level {
            0 | 1 => "Title",
            2 => "Heading1",
            _ => "Heading2",
        };
        self.output.push_str("<w:p>\n");
        self.output.push_str("<w:pPr>\n");
        self.output
            .push_str(&format!("<w:pStyle w:val=\"{}\"/>\n", style));
        self.output.push_str("</w:pPr>\n");
        for inline in &heading.text {
            self.generate_inline(inline, RunFormat::default());
        }
        self.output.push_str("</w:p>\n");
    }

    /// Generate XML for a table
    fn generate_table(&mut self, table: &Table) {
        let column_count = table.column_count();
        if column_count == 0 {
            return;
        }

        if let Some(caption) = &table.caption {
            self.output.push_str("<w:p>\n");
            self.output.push_str("<w:pPr>\n");
            self.output.push_str("<w:keepNext/>\n");
            self.push_justification(Alignment::Center);
            self.output.push_str("</w:pPr>\n");
            for inline in caption {
                self.generate_inline(inline, RunFormat::default().with(FormatType::Bold));
            }
            self.output.push_str("</w:p>\n");
        }

        let grid = self.column_widths(table, column_count);

        self.output.push_str("<w:tbl>\n");
        self.output.push_str("<w:tblPr>\n");
        self.output.push_str("<w:tblStyle w:val=\"TableGrid\"/>\n");
        self.output.push_str(&format!(
            "<w:tblW w:w=\"{}\" w:type=\"dxa\"/>\n",
            grid.iter().sum::<u32>()
        ));
        self.output.push_str("<w:tblLayout w:type=\"fixed\"/>\n");
        self.output.push_str("</w:tblPr>\n");

        self.output.push_str("<w:tblGrid>\n");
        for width in &grid {
            self.output
                .push_str(&format!("<w:gridCol w:w=\"{}\"/>\n", width));
        }
        self.output.push_str("</w:tblGrid>\n");

        for row in &table.rows {
            self.output.push_str("<w:tr>\n");

            if row.is_header {
                self.output.push_str("<w:trPr>\n");
                self.output.push_str("<w:tblHeader/>\n");
                self.output.push_str("</w:trPr>\n");
            }

            let mut column = 0usize;
            for cell in &row.cells {
                let span = (cell.colspan.max(1) as usize).min(column_count.saturating_sub(column).max(1));
                let width: u32 = grid.iter().skip(column).take(span).sum();
                let align = cell
                    .align
                    .or_else(|| table.columns.get(column).and_then(|c| c.align));
                column += span;

                self.output.push_str("<w:tc>\n");
                self.output.push_str("<w:tcPr>\n");
                self.output
                    .push_str(&format!("<w:tcW w:w=\"{}\" w:type=\"dxa\"/>\n", width));
                if span > 1 {
                    self.output
                        .push_str(&format!("<w:gridSpan w:val=\"{}\"/>\n", span));
                }
                self.output.push_str("</w:tcPr>\n");

                // Every cell needs at least one paragraph
                if cell.is_empty() {
                    self.output.push_str("<w:p/>\n");
                } else {
                    self.output.push_str("<w:p>\n");
                    if let Some(align) = align {
                        self.output.push_str("<w:pPr>\n");
                        self.push_justification(align);
                        self.output.push_str("</w:pPr>\n");
                    }
                    let format = RunFormat {
                        bold: row.is_header,
                        italic: false,
                    };
                    for inline in &cell.content {
                        self.generate_inline(inline, format);
                    }
                    self.output.push_str("</w:p>\n");
                }

                self.output.push_str("</w:tc>\n");
            }

            self.output.push_str("</w:tr>\n");
        }

        self.output.push_str("</w:tbl>\n");
        // Word merges adjacent tables without a paragraph between them
        self.output.push_str("<w:p/>\n");
    }

    /// Grid column widths in twips, proportional to the column weights
    fn column_widths(&self, table: &Table, column_count: usize) -> Vec<u32> {
        let weights: Vec<u32> = (0..column_count)
            .map(|i| {
                table
                    .columns
                    .get(i)
                    .and_then(|c| c.width)
                    .unwrap_or(1)
                    .max(1)
            })
            .collect();
        let total: u32 = weights.iter().sum();
        let usable = self.usable_width();
        weights.iter().map(|w| usable * w / total).collect()
    }

    fn generate_break(&mut self, break_type: &BreakType) {
        match break_type {
            BreakType::Page => {
                self.output.push_str("<w:p>\n");
                self.output.push_str("<w:r>\n");
                self.output.push_str("<w:br w:type=\"page\"/>\n");
                self.output.push_str("</w:r>\n");
                self.output.push_str("</w:p>\n");
            }
            BreakType::Section => {
                self.output.push_str("<w:p>\n");
                self.output.push_str("<w:pPr>\n");
                self.output.push_str("<w:sectPr>\n");
                self.push_page_geometry();
                self.output.push_str("<w:type w:val=\"nextPage\"/>\n");
                self.output.push_str("</w:sectPr>\n");
                self.output.push_str("</w:pPr>\n");
                self.output.push_str("</w:p>\n");
            }
        }
    }

    fn generate_inline(&mut self, inline: &Inline, format: RunFormat) {
        match inline {
            Inline::Text(text) => self.generate_run(text, format),
            Inline::Format(format_type, inner) => {
                self.generate_inline(inner, format.with(*format_type));
            }
            Inline::Span(inlines) => {
                for inline in inlines {
                    self.generate_inline(inline, format);
                }
            }
            Inline::Break => {
                self.output.push_str("<w:r>\n");
                self.output.push_str("<w:br/>\n");
                self.output.push_str("</w:r>\n");
            }
        }
    }

    fn generate_run(&mut self, text: &str, format: RunFormat) {
        if text.is_empty() {
            return;
        }
        self.output.push_str("<w:r>\n");
        if format.bold || format.italic {
            self.output.push_str("<w:rPr>\n");
            if format.bold {
                self.output.push_str("<w:b/>\n");
            }
            if format.italic {
                self.output.push_str("<w:i/>\n");
            }
            self.output.push_str("</w:rPr>\n");
        }
        if text.starts_with(' ') || text.ends_with(' ') {
            self.output.push_str(&format!(
                "<w:t xml:space=\"preserve\">{}</w:t>\n",
                escape_xml(text)
            ));
        } else {
            self.output
                .push_str(&format!("<w:t>{}</w:t>\n", escape_xml(text)));
        }
        self.output.push_str("</w:r>\n");
    }

    fn push_justification(&mut self, align: Alignment) {
        let val = match align {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        };
        self.output.push_str(&format!("<w:jc w:val=\"{}\"/>\n", val));
    }

    fn push_page_geometry(&mut self) {
        match self.orientation {
            Orientation::Portrait => self.output.push_str(&format!(
                "<w:pgSz w:w=\"{}\" w:h=\"{}\"/>\n",
                PAGE_SHORT_EDGE, PAGE_LONG_EDGE
            )),
            Orientation::Landscape => self.output.push_str(&format!(
                "<w:pgSz w:w=\"{}\" w:h=\"{}\" w:orient=\"landscape\"/>\n",
                PAGE_LONG_EDGE, PAGE_SHORT_EDGE
            )),
        }
        self.output.push_str(&format!(
            "<w:pgMar w:top=\"{m}\" w:right=\"{m}\" w:bottom=\"{m}\" w:left=\"{m}\" \
             w:header=\"567\" w:footer=\"567\" w:gutter=\"0\"/>\n",
            m = PAGE_MARGIN
        ));
    }

    fn generate_section_properties(&mut self) {
        self.output.push_str("<w:sectPr>\n");
        self.push_page_geometry();
        self.output.push_str("</w:sectPr>\n");
    }
}

/// docProps/core.xml; carries no timestamps so output stays reproducible
fn core_properties(doc: &Document) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    out.push_str(
        "<cp:coreProperties \
         xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n",
    );
    out.push_str(&format!(
        "<dc:title>{}</dc:title>\n",
        escape_xml(doc.title_or_default())
    ));
    out.push_str("<dc:creator>billgen</dc:creator>\n");
    out.push_str("</cp:coreProperties>\n");
    out
}

/// Escape special XML characters
fn escape_xml(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use billgen_ast::{ColumnSpec, TableCell, TableRow};
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn sample_table() -> Table {
        Table {
            rows: vec![
                TableRow::header(&["Item", "Description", "Amount"]),
                TableRow::body(vec![
                    TableCell::text("1"),
                    TableCell::text("Earth work & filling"),
                    TableCell::number("1,250.00"),
                ]),
                TableRow::body(vec![
                    TableCell::bold("Total").spanning(2),
                    TableCell::number("1,250.00"),
                ]),
            ],
            caption: None,
            columns: vec![
                ColumnSpec { width: Some(1), align: None },
                ColumnSpec { width: Some(3), align: None },
                ColumnSpec { width: Some(1), align: Some(Alignment::Right) },
            ],
        }
    }

    /// Count start or empty elements with the given qualified name
    fn count_elements(xml: &str, name: &[u8]) -> usize {
        let mut reader = Reader::from_str(xml);
        let mut count = 0;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == name => {
                    count += 1
                }
                Ok(Event::Eof) => break,
                Err(e) => panic!("malformed XML: {}", e),
                _ => {}
            }
        }
        count
    }

    #[test]
    fn test_package_parts() {
        let bytes = DocxWriter::generate(&Document::with_title("Summary")).unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));

        let archive = PartArchive::from_bytes(&bytes).unwrap();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
            "docProps/core.xml",
        ] {
            assert!(archive.contains(part), "missing {}", part);
        }
        let core = archive.get_string("docProps/core.xml").unwrap();
        assert!(core.contains("<dc:title>Summary</dc:title>"));
    }

    #[test]
    fn test_generate_is_deterministic() {
        let mut doc = Document::with_title("Certificate II");
        doc.push(Block::Table(sample_table()));
        assert_eq!(
            DocxWriter::generate(&doc).unwrap(),
            DocxWriter::generate(&doc).unwrap()
        );
    }

    #[test]
    fn test_table_structure() {
        let mut doc = Document::new();
        doc.push(Block::Table(sample_table()));
        let xml = DocxWriter::document_xml(&doc);

        assert_eq!(count_elements(&xml, b"w:tbl"), 1);
        assert_eq!(count_elements(&xml, b"w:tr"), 3);
        assert_eq!(count_elements(&xml, b"w:gridCol"), 3);
        assert_eq!(count_elements(&xml, b"w:tblHeader"), 1);
        assert_eq!(count_elements(&xml, b"w:gridSpan"), 1);
        assert!(xml.contains("<w:gridSpan w:val=\"2\"/>"));
        assert!(xml.contains("Earth work &amp; filling"));
        assert!(xml.contains("<w:jc w:val=\"right\"/>"));
    }

    #[test]
    fn test_column_widths_follow_weights() {
        let mut doc = Document::new();
        doc.push(Block::Table(sample_table()));
        let xml = DocxWriter::document_xml(&doc);

        // 9638 twips usable on portrait A4, split 1:3:1
        assert!(xml.contains("<w:gridCol w:w=\"1927\"/>"));
        assert!(xml.contains("<w:gridCol w:w=\"5782\"/>"));
    }

    #[test]
    fn test_landscape_section() {
        let mut doc = Document::with_title("Deviation Statement");
        doc.metadata.orientation = Orientation::Landscape;
        let xml = DocxWriter::document_xml(&doc);
        assert!(xml.contains("<w:pgSz w:w=\"16838\" w:h=\"11906\" w:orient=\"landscape\"/>"));

        let portrait = DocxWriter::document_xml(&Document::new());
        assert!(portrait.contains("<w:pgSz w:w=\"11906\" w:h=\"16838\"/>"));
    }

    #[test]
    fn test_empty_cells_still_have_paragraph() {
        let mut doc = Document::new();
        doc.push(Block::Table(Table {
            rows: vec![TableRow::body(vec![TableCell::empty(), TableCell::text("x")])],
            caption: None,
            columns: Vec::new(),
        }));
        let xml = DocxWriter::document_xml(&doc);
        assert_eq!(count_elements(&xml, b"w:tc"), 2);
        assert!(xml.contains("<w:tc>\n<w:tcPr>\n<w:tcW w:w=\"4819\" w:type=\"dxa\"/>\n</w:tcPr>\n<w:p/>\n</w:tc>"));
    }

    #[test]
    fn test_formatted_runs() {
        let mut doc = Document::new();
        doc.push(Block::Paragraph(Paragraph {
            inlines: vec![
                Inline::Text("Amount: ".to_string()),
                Inline::Format(
                    FormatType::Bold,
                    Box::new(Inline::Format(
                        FormatType::Italic,
                        Box::new(Inline::Text("Rs. 100".to_string())),
                    )),
                ),
            ],
            align: Some(Alignment::Center),
        }));
        let xml = DocxWriter::document_xml(&doc);
        assert!(xml.contains("<w:t xml:space=\"preserve\">Amount: </w:t>"));
        assert!(xml.contains("<w:rPr>\n<w:b/>\n<w:i/>\n</w:rPr>\n<w:t>Rs. 100</w:t>"));
        assert!(xml.contains("<w:jc w:val=\"center\"/>"));
    }

    #[test]
    fn test_headings_and_page_break() {
        let mut doc = Document::new();
        doc.push(Block::Heading(Heading::new(1, "Summary")));
        doc.push(Block::Heading(Heading::new(2, "Part A")));
        doc.push(Block::Break(BreakType::Page));
        let xml = DocxWriter::document_xml(&doc);
        assert!(xml.contains("<w:pStyle w:val=\"Title\"/>"));
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(xml.contains("<w:br w:type=\"page\"/>"));
        assert_eq!(count_elements(&xml, b"w:sectPr"), 1);
    }
}
