//! Content rendering
//!
//! Turns a dataset, a logical document and its template into the
//! format-neutral `billgen_ast::Document` every backend consumes.
//! Rendering is pure: the same inputs always give the same tree.
//!
//! Rows whose rate is absent or zero carry only item number and
//! description; their unit, quantity and amount cells stay empty.

use billgen_ast::{
    Alignment, Block, ColumnSpec, Document, Heading, Orientation, Paragraph, Table, TableCell,
    TableRow,
};
use billgen_data::{
    amount_in_words, format_amount, format_percent, format_quantity, BillingDataset, ItemKind,
    LineItem,
};

use crate::document::LogicalDocument;
use crate::error::RenderError;
use crate::template::{parse_line, Segment, Template};

/// Dataset fields each document cannot do without
fn required_fields(document: LogicalDocument) -> &'static [&'static str] {
    match document {
        LogicalDocument::Summary => &["project_name"],
        LogicalDocument::DeviationStatement => &["project_name", "agreement_no"],
        LogicalDocument::ExtraItems => &["project_name"],
        LogicalDocument::CertificateI => &["project_name", "agency", "measurement_date"],
        LogicalDocument::CertificateII => &["project_name", "agency", "bill_number"],
        LogicalDocument::ScrutinySheet => {
            &["project_name", "agency", "agreement_no", "work_order_no"]
        }
    }
}

/// Renders logical documents
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentRenderer;

impl ContentRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render one logical document
    pub fn render(
        &self,
        dataset: &BillingDataset,
        document: LogicalDocument,
        template: &Template,
    ) -> Result<Document, RenderError> {
        check_shape(dataset, document, template)?;

        let mut doc = Document::with_title(document.title());
        doc.metadata.orientation = if template.landscape {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        doc.metadata.set_attribute("document", document.id());
        if let Some(project) = dataset.title.field("project_name") {
            doc.metadata.set_attribute("project", project);
        }
        if let Some(agency) = dataset.title.field("agency") {
            doc.metadata.set_attribute("agency", agency);
        }

        let heading = template
            .title
            .clone()
            .unwrap_or_else(|| document.title().to_string());
        doc.push(Block::Heading(Heading::new(1, heading)));

        for line in &template.preamble {
            doc.push(Block::Paragraph(Paragraph::text(expand(
                line, dataset, document,
            )?)));
        }

        let body = match document {
            LogicalDocument::Summary => summary(dataset, template),
            LogicalDocument::DeviationStatement => deviation_statement(dataset, template),
            LogicalDocument::ExtraItems => extra_items(dataset, template),
            LogicalDocument::CertificateI => certificate_i(dataset, template),
            LogicalDocument::CertificateII => certificate_ii(dataset, template),
            LogicalDocument::ScrutinySheet => scrutiny_sheet(dataset, template),
        };
        doc.blocks.extend(body);

        for line in &template.footer {
            doc.push(Block::Paragraph(Paragraph::text(expand(
                line, dataset, document,
            )?)));
        }

        Ok(doc)
    }
}

fn check_shape(
    dataset: &BillingDataset,
    document: LogicalDocument,
    template: &Template,
) -> Result<(), RenderError> {
    let missing = |field: &str| RenderError::DataShapeError {
        document,
        field: field.to_string(),
    };

    let fields = required_fields(document)
        .iter()
        .map(|f| f.to_string())
        .chain(template.required.iter().cloned())
        .chain(template.placeholders());
    for field in fields {
        if field_value(dataset, &field).is_none() {
            return Err(missing(&field));
        }
    }

    let needs_work_order = matches!(
        document,
        LogicalDocument::Summary | LogicalDocument::DeviationStatement
    );
    if needs_work_order && dataset.work_order.is_empty() {
        return Err(missing("work_order"));
    }
    Ok(())
}

/// Value of a placeholder: a title field or a computed bill figure
pub fn field_value(dataset: &BillingDataset, name: &str) -> Option<String> {
    let computed = match name {
        "work_order_value" => dataset.work_order_value(),
        "work_order_to_date" => dataset.total_to_date(ItemKind::WorkOrder),
        "extra_items_value" => dataset.total_to_date(ItemKind::ExtraItem),
        "gross_to_date" => dataset.gross_to_date(),
        "amount_paid_last_bill" => dataset.title.amount_paid_last_bill.unwrap_or(0.0),
        "payable_now" => dataset.payable_now(),
        "payable_in_words" => return Some(amount_in_words(dataset.payable_now())),
        other => return dataset.title.field(other).map(str::to_string),
    };
    Some(format_amount(computed))
}

fn expand(
    line: &str,
    dataset: &BillingDataset,
    document: LogicalDocument,
) -> Result<String, RenderError> {
    let mut out = String::with_capacity(line.len());
    for segment in parse_line(line) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field(name) => {
                let value =
                    field_value(dataset, name).ok_or_else(|| RenderError::DataShapeError {
                        document,
                        field: name.to_string(),
                    })?;
                out.push_str(&value);
            }
        }
    }
    Ok(out)
}

/// Column labels and specs for the main table
///
/// Template values apply only when they match the table's width.
fn columns(
    template: &Template,
    defaults: &[&str],
    numeric_from: usize,
) -> (Vec<String>, Vec<ColumnSpec>) {
    let labels = if template.column_labels.len() == defaults.len() {
        template.column_labels.clone()
    } else {
        if !template.column_labels.is_empty() {
            tracing::warn!(
                expected = defaults.len(),
                found = template.column_labels.len(),
                "Ignoring template column labels"
            );
        }
        defaults.iter().map(|s| s.to_string()).collect()
    };
    let widths_fit = template.column_widths.len() == defaults.len();
    let specs = (0..defaults.len())
        .map(|i| ColumnSpec {
            width: if widths_fit {
                Some(template.column_widths[i].max(1))
            } else {
                None
            },
            align: (i >= numeric_from).then_some(Alignment::Right),
        })
        .collect();
    (labels, specs)
}

fn table(labels: Vec<String>, columns: Vec<ColumnSpec>, body: Vec<TableRow>) -> Table {
    let mut rows = Vec::with_capacity(body.len() + 1);
    rows.push(TableRow::header(labels.as_slice()));
    rows.extend(body);
    Table {
        rows,
        caption: None,
        columns,
    }
}

fn opt_amount(value: Option<f64>) -> TableCell {
    TableCell::number(value.map(format_amount).unwrap_or_default())
}

fn opt_quantity(value: Option<f64>) -> TableCell {
    TableCell::number(value.map(format_quantity).unwrap_or_default())
}

/// Row with a bold label spanning `span` columns followed by bold figures
fn total_row(label: &str, span: u32, figures: &[Option<f64>]) -> TableRow {
    let mut cells = vec![TableCell::bold(label).spanning(span)];
    cells.extend(figures.iter().map(|value| match value {
        Some(v) => TableCell::bold(format_amount(*v)).aligned(Alignment::Right),
        None => TableCell::empty(),
    }));
    TableRow::body(cells)
}

fn section_row(label: &str, width: u32) -> TableRow {
    TableRow::body(vec![TableCell::bold(label).spanning(width)])
}

/// Leading identity cells, then either `priced` cells or blanks
fn item_row(item: &LineItem, width: usize, priced: impl FnOnce() -> Vec<TableCell>) -> TableRow {
    let mut cells = vec![
        TableCell::text(item.item_no.as_str()),
        TableCell::text(item.description.as_str()),
    ];
    if item.is_priced() {
        cells.extend(priced());
    }
    cells.resize_with(width, TableCell::empty);
    TableRow::body(cells)
}

fn unit_cell(item: &LineItem) -> TableCell {
    TableCell::text(item.unit.clone().unwrap_or_default())
}

fn summary(dataset: &BillingDataset, template: &Template) -> Vec<Block> {
    const DEFAULTS: [&str; 7] = [
        "Item",
        "Description",
        "Unit",
        "Qty to date",
        "Rate",
        "Amount to date",
        "Since last bill",
    ];
    let (labels, specs) = columns(template, &DEFAULTS, 3);
    let width = DEFAULTS.len() as u32;
    let mut rows = Vec::new();

    let schedules = [
        (ItemKind::WorkOrder, "A. Work-order items", "Total (A)"),
        (ItemKind::ExtraItem, "B. Extra items", "Total (B)"),
    ];
    for (kind, heading, total_label) in schedules {
        let items = dataset.items(kind);
        if items.is_empty() {
            continue;
        }
        rows.push(section_row(heading, width));
        for item in items {
            rows.push(item_row(item, DEFAULTS.len(), || {
                vec![
                    unit_cell(item),
                    TableCell::number(format_quantity(item.qty_to_date)),
                    opt_amount(item.billable_rate()),
                    opt_amount(item.amount_to_date()),
                    opt_amount(item.amount_since_last()),
                ]
            }));
        }
        rows.push(total_row(
            total_label,
            5,
            &[
                Some(dataset.total_to_date(kind)),
                Some(dataset.total_since_last(kind)),
            ],
        ));
    }

    let since_last =
        dataset.total_since_last(ItemKind::WorkOrder) + dataset.total_since_last(ItemKind::ExtraItem);
    rows.push(total_row(
        "Gross value of work done",
        5,
        &[Some(dataset.gross_to_date()), Some(since_last)],
    ));
    rows.push(total_row(
        "Less amount paid in last bill",
        5,
        &[dataset.title.amount_paid_last_bill.or(Some(0.0)), None],
    ));
    rows.push(total_row("Net payable", 5, &[Some(dataset.payable_now()), None]));

    vec![
        Block::Table(table(labels, specs, rows)),
        Block::Paragraph(Paragraph::text(format!(
            "In words: {}",
            amount_in_words(dataset.payable_now())
        ))),
    ]
}

fn deviation_statement(dataset: &BillingDataset, template: &Template) -> Vec<Block> {
    const DEFAULTS: [&str; 12] = [
        "Item",
        "Description",
        "Unit",
        "Rate",
        "WO Qty",
        "WO Amount",
        "Executed Qty",
        "Executed Amount",
        "Excess Qty",
        "Excess Amount",
        "Saving Qty",
        "Saving Amount",
    ];
    let (labels, specs) = columns(template, &DEFAULTS, 3);
    let mut rows = Vec::new();

    let mut wo_total = 0.0;
    let mut executed_total = 0.0;
    let mut excess_total = 0.0;
    let mut saving_total = 0.0;
    for item in &dataset.work_order {
        wo_total += item.amount_work_order().unwrap_or(0.0);
        executed_total += item.amount_to_date().unwrap_or(0.0);
        excess_total += item.excess_amount().unwrap_or(0.0);
        saving_total += item.saving_amount().unwrap_or(0.0);

        rows.push(item_row(item, DEFAULTS.len(), || {
            vec![
                unit_cell(item),
                opt_amount(item.billable_rate()),
                opt_quantity(Some(item.qty_work_order.unwrap_or(0.0))),
                opt_amount(item.amount_work_order()),
                opt_quantity(Some(item.qty_to_date)),
                opt_amount(item.amount_to_date()),
                opt_quantity(item.excess_qty()),
                opt_amount(item.excess_amount()),
                opt_quantity(item.saving_qty()),
                opt_amount(item.saving_amount()),
            ]
        }));
    }

    rows.push(TableRow::body(vec![
        TableCell::bold("Total work-order items").spanning(5),
        TableCell::bold(format_amount(wo_total)).aligned(Alignment::Right),
        TableCell::empty(),
        TableCell::bold(format_amount(executed_total)).aligned(Alignment::Right),
        TableCell::empty(),
        TableCell::bold(format_amount(excess_total)).aligned(Alignment::Right),
        TableCell::empty(),
        TableCell::bold(format_amount(saving_total)).aligned(Alignment::Right),
    ]));

    let extras = dataset.total_to_date(ItemKind::ExtraItem);
    if !dataset.extra_items.is_empty() {
        rows.push(TableRow::body(vec![
            TableCell::text("Extra items").spanning(7),
            TableCell::number(format_amount(extras)),
            TableCell::empty(),
            TableCell::number(format_amount(extras)),
            TableCell::empty().spanning(2),
        ]));
    }

    let net = executed_total + extras - wo_total;
    let verdict = if net >= 0.0 { "Net excess" } else { "Net saving" };
    let mut text = format!("{}: {}", verdict, format_amount(net.abs()));
    if wo_total > 0.0 {
        text.push_str(&format!(
            " ({} of work-order value)",
            format_percent(net.abs() * 100.0 / wo_total)
        ));
    }

    vec![
        Block::Table(table(labels, specs, rows)),
        Block::Paragraph(Paragraph::bold(text)),
    ]
}

fn extra_items(dataset: &BillingDataset, template: &Template) -> Vec<Block> {
    const DEFAULTS: [&str; 6] = ["Item", "Description", "Unit", "Quantity", "Rate", "Amount"];
    let (labels, specs) = columns(template, &DEFAULTS, 3);
    let mut rows = Vec::new();

    if dataset.extra_items.is_empty() {
        rows.push(TableRow::body(vec![TableCell::text("No extra items executed.")
            .spanning(DEFAULTS.len() as u32)
            .aligned(Alignment::Center)]));
    } else {
        for item in &dataset.extra_items {
            rows.push(item_row(item, DEFAULTS.len(), || {
                vec![
                    unit_cell(item),
                    TableCell::number(format_quantity(item.qty_to_date)),
                    opt_amount(item.billable_rate()),
                    opt_amount(item.amount_to_date()),
                ]
            }));
        }
        rows.push(total_row(
            "Total extra items",
            5,
            &[Some(dataset.total_to_date(ItemKind::ExtraItem))],
        ));
    }

    vec![Block::Table(table(labels, specs, rows))]
}

/// Two-column particulars/amount table
fn particulars(template: &Template, entries: Vec<(String, String, bool)>) -> Block {
    const DEFAULTS: [&str; 2] = ["Particulars", "Amount"];
    let (labels, specs) = columns(template, &DEFAULTS, 1);
    let rows = entries
        .into_iter()
        .map(|(label, value, strong)| {
            if strong {
                TableRow::body(vec![
                    TableCell::bold(label),
                    TableCell::bold(value).aligned(Alignment::Right),
                ])
            } else {
                TableRow::body(vec![TableCell::text(label), TableCell::number(value)])
            }
        })
        .collect();
    Block::Table(table(labels, specs, rows))
}

fn certificate_i(dataset: &BillingDataset, template: &Template) -> Vec<Block> {
    let since_last =
        dataset.total_since_last(ItemKind::WorkOrder) + dataset.total_since_last(ItemKind::ExtraItem);
    vec![particulars(
        template,
        vec![
            (
                "Value of work-order items executed to date".to_string(),
                format_amount(dataset.total_to_date(ItemKind::WorkOrder)),
                false,
            ),
            (
                "Value of extra items executed to date".to_string(),
                format_amount(dataset.total_to_date(ItemKind::ExtraItem)),
                false,
            ),
            (
                "Gross value of work done to date".to_string(),
                format_amount(dataset.gross_to_date()),
                true,
            ),
            (
                "Value of work done since last bill".to_string(),
                format_amount(since_last),
                false,
            ),
        ],
    )]
}

fn certificate_ii(dataset: &BillingDataset, template: &Template) -> Vec<Block> {
    let paid = dataset.title.amount_paid_last_bill.unwrap_or(0.0);
    vec![
        particulars(
            template,
            vec![
                (
                    "Total value of work done to date".to_string(),
                    format_amount(dataset.gross_to_date()),
                    false,
                ),
                (
                    "Deduct amount paid in previous bills".to_string(),
                    format_amount(paid),
                    false,
                ),
                (
                    "Net amount payable".to_string(),
                    format_amount(dataset.payable_now()),
                    true,
                ),
            ],
        ),
        Block::Paragraph(Paragraph::text(format!(
            "In words: {}",
            amount_in_words(dataset.payable_now())
        ))),
    ]
}

fn scrutiny_sheet(dataset: &BillingDataset, template: &Template) -> Vec<Block> {
    let title = &dataset.title;
    let text = |name: &str| title.field(name).unwrap_or("-").to_string();

    let mut entries = vec![
        ("Name of work".to_string(), text("project_name"), false),
        ("Agency".to_string(), text("agency"), false),
        ("Agreement No.".to_string(), text("agreement_no"), false),
        ("Work order No.".to_string(), text("work_order_no"), false),
        ("Bill".to_string(), text("bill_number"), false),
        ("Date of start".to_string(), text("start_date"), false),
        (
            "Scheduled completion".to_string(),
            text("scheduled_completion"),
            false,
        ),
        (
            "Actual completion".to_string(),
            text("actual_completion"),
            false,
        ),
        (
            "Date of measurement".to_string(),
            text("measurement_date"),
            false,
        ),
    ];
    for (key, value) in &title.extra {
        if !value.trim().is_empty() {
            entries.push((key.replace('_', " "), value.trim().to_string(), false));
        }
    }

    let priced = dataset
        .work_order
        .iter()
        .chain(&dataset.extra_items)
        .filter(|i| i.is_priced())
        .count();
    let unpriced = dataset.work_order.len() + dataset.extra_items.len() - priced;
    entries.extend([
        (
            "Work-order value".to_string(),
            format_amount(dataset.work_order_value()),
            false,
        ),
        (
            "Gross value of work done".to_string(),
            format_amount(dataset.gross_to_date()),
            false,
        ),
        (
            "Extra items".to_string(),
            format_amount(dataset.total_to_date(ItemKind::ExtraItem)),
            false,
        ),
        (
            "Amount paid in last bill".to_string(),
            format_amount(title.amount_paid_last_bill.unwrap_or(0.0)),
            false,
        ),
        (
            "Net payable".to_string(),
            format_amount(dataset.payable_now()),
            true,
        ),
        ("Priced items".to_string(), priced.to_string(), false),
        ("Items without rate".to_string(), unpriced.to_string(), false),
    ]);

    vec![particulars(template, entries)]
}
