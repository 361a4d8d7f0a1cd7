//! Direct PDF writer built on lopdf
//!
//! Lays content out with the standard Helvetica fonts: headings and
//! paragraphs as text lines, tables as ruled grids with proportional
//! column widths. Cell text longer than its column is truncated. No
//! external tools or font files are needed, so this writer is the last
//! resort of the paginated chain.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as PdfDocument, Object, ObjectId, Stream};

use billgen_ast::{Alignment, Block, Document, Inline, Orientation, Table, TableRow};

use crate::error::Result;

const A4_SHORT: i64 = 595;
const A4_LONG: i64 = 842;
const MARGIN: i64 = 36;
const BODY_SIZE: i64 = 8;
const HEADING_SIZE: i64 = 13;
const SUBHEADING_SIZE: i64 = 10;
const ROW_HEIGHT: i64 = 14;
const CELL_PAD: i64 = 3;

/// Writer producing PDF bytes without a typesetting engine
pub struct SimplePdfWriter {
    width: i64,
    height: i64,
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: i64,
}

impl SimplePdfWriter {
    /// Render a document to PDF bytes
    pub fn write(content: &Document) -> Result<Vec<u8>> {
        let (width, height) = match content.metadata.orientation {
            Orientation::Portrait => (A4_SHORT, A4_LONG),
            Orientation::Landscape => (A4_LONG, A4_SHORT),
        };
        let mut writer = Self {
            width,
            height,
            pages: Vec::new(),
            current: Vec::new(),
            y: height - MARGIN,
        };

        for block in &content.blocks {
            writer.layout_block(block);
        }
        writer.finish_page();

        writer.build(content.metadata.title.as_deref())
    }

    fn usable_width(&self) -> i64 {
        self.width - 2 * MARGIN
    }

    fn finish_page(&mut self) {
        let ops = std::mem::take(&mut self.current);
        if !ops.is_empty() || self.pages.is_empty() {
            self.pages.push(ops);
        }
        self.y = self.height - MARGIN;
    }

    fn ensure_space(&mut self, needed: i64) {
        if self.y - needed < MARGIN && !self.current.is_empty() {
            self.finish_page();
        }
    }

    fn layout_block(&mut self, block: &Block) {
        match block {
            Block::Heading(h) => {
                let size = if h.level <= 1 { HEADING_SIZE } else { SUBHEADING_SIZE };
                let align = if h.level <= 1 {
                    Alignment::Center
                } else {
                    Alignment::Left
                };
                let width = self.usable_width();
                self.ensure_space(size + 8);
                self.y -= size + 4;
                let text = Inline::plain_text_of(&h.text);
                self.text_line(&text, "F2", size, align, MARGIN, width);
                self.y -= 4;
            }
            Block::Paragraph(p) => {
                let text = Inline::plain_text_of(&p.inlines);
                let bold = p.inlines.iter().all(is_bold);
                let font = if bold { "F2" } else { "F1" };
                let align = p.align.unwrap_or(Alignment::Left);
                let width = self.usable_width();
                for line in text.lines() {
                    self.ensure_space(BODY_SIZE + 4);
                    self.y -= BODY_SIZE + 4;
                    self.text_line(line, font, BODY_SIZE, align, MARGIN, width);
                }
                self.y -= 2;
            }
            Block::Table(table) => self.layout_table(table),
            Block::Break(_) => {
                if !self.current.is_empty() {
                    self.finish_page();
                }
            }
        }
    }

    fn layout_table(&mut self, table: &Table) {
        let count = table.column_count().max(1);
        let weights: Vec<i64> = (0..count)
            .map(|i| {
                table
                    .columns
                    .get(i)
                    .and_then(|c| c.width)
                    .map(i64::from)
                    .unwrap_or(1)
                    .max(1)
            })
            .collect();
        let total: i64 = weights.iter().sum();
        let usable = self.usable_width();

        let mut edges = Vec::with_capacity(count + 1);
        let mut x = MARGIN;
        let mut acc = 0;
        edges.push(x);
        for w in &weights {
            acc += w;
            x = MARGIN + usable * acc / total;
            edges.push(x);
        }

        if let Some(caption) = &table.caption {
            self.ensure_space(ROW_HEIGHT);
            self.y -= BODY_SIZE + 4;
            let text = Inline::plain_text_of(caption);
            self.text_line(&text, "F2", BODY_SIZE, Alignment::Center, MARGIN, usable);
            self.y -= 2;
        }

        let header: Vec<&TableRow> = table.rows.iter().filter(|r| r.is_header).collect();
        for row in &table.rows {
            if self.y - ROW_HEIGHT < MARGIN {
                self.finish_page();
                // repeat header rows at the top of continuation pages
                if !row.is_header {
                    for h in &header {
                        self.layout_row(h, table, &edges);
                    }
                }
            }
            self.layout_row(row, table, &edges);
        }
        self.y -= 6;
    }

    fn layout_row(&mut self, row: &TableRow, table: &Table, edges: &[i64]) {
        let top = self.y;
        let bottom = self.y - ROW_HEIGHT;
        let mut column = 0usize;
        let last = edges.len() - 1;

        for cell in &row.cells {
            let span = cell.colspan.max(1) as usize;
            let start = column.min(last);
            let end = (column + span).min(last);
            column += span;
            if start == end {
                continue;
            }
            let (x0, x1) = (edges[start], edges[end]);

            self.current.push(Operation::new(
                "re",
                vec![
                    Object::Integer(x0),
                    Object::Integer(bottom),
                    Object::Integer(x1 - x0),
                    Object::Integer(ROW_HEIGHT),
                ],
            ));
            self.current.push(Operation::new("S", vec![]));

            let text = cell.plain_text();
            if text.trim().is_empty() {
                continue;
            }
            let align = cell
                .align
                .or_else(|| table.columns.get(start).and_then(|c| c.align))
                .unwrap_or(Alignment::Left);
            let bold = row.is_header || cell.content.iter().all(is_bold);
            let font = if bold { "F2" } else { "F1" };
            let saved = self.y;
            self.y = bottom + 4;
            self.text_line(
                &text,
                font,
                BODY_SIZE,
                align,
                x0 + CELL_PAD,
                x1 - x0 - 2 * CELL_PAD,
            );
            self.y = saved;
        }

        self.y = top - ROW_HEIGHT;
    }

    fn text_line(
        &mut self,
        text: &str,
        font: &str,
        size: i64,
        align: Alignment,
        x: i64,
        width: i64,
    ) {
        let fitted = fit_text(text, size, width);
        if fitted.is_empty() {
            return;
        }
        let text_width = approx_width(&fitted, size);
        let left = match align {
            Alignment::Left => x,
            Alignment::Center => x + (width - text_width).max(0) / 2,
            Alignment::Right => x + (width - text_width).max(0),
        };
        self.current.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
            ),
            Operation::new("Td", vec![Object::Integer(left), Object::Integer(self.y)]),
            Operation::new("Tj", vec![Object::string_literal(fitted)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn build(self, title: Option<&str>) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for mut operations in self.pages {
            operations.insert(0, Operation::new("w", vec![Object::Real(0.5)]));
            let content = Content { operations };
            let encoded = content.encode()?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(self.width),
                Object::Integer(self.height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        if let Some(title) = title {
            let info_id = doc.add_object(dictionary! {
                "Title" => Object::string_literal(to_latin1(title)),
                "Producer" => Object::string_literal("billgen"),
            });
            doc.trailer.set("Info", info_id);
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn is_bold(inline: &Inline) -> bool {
    matches!(inline, Inline::Format(billgen_ast::FormatType::Bold, _))
}

// Helvetica averages a little over half the font size per glyph.
fn approx_width(text: &[u8], size: i64) -> i64 {
    text.len() as i64 * size * 11 / 20
}

/// Encode for WinAnsi and truncate to the available width
fn fit_text(text: &str, size: i64, width: i64) -> Vec<u8> {
    let mut bytes = to_latin1(text);
    let per_glyph = (size * 11 / 20).max(1);
    let max = (width / per_glyph).max(0) as usize;
    if bytes.len() > max {
        bytes.truncate(max.saturating_sub(2));
        bytes.extend_from_slice(b"..");
    }
    bytes
}

fn to_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if (0x20..0x7f).contains(&code) || (0xa0..=0xff).contains(&code) {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}
