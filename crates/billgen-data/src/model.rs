//! Billing dataset model
//!
//! A [`BillingDataset`] is the complete structured input for one input
//! file. It is produced once by loading and never mutated afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{DataError, Result};

/// Complete structured input for one bill
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingDataset {
    /// Title page metadata
    pub title: TitleMeta,
    /// Work-order (agreement) line items, in sheet order
    pub work_order: Vec<LineItem>,
    /// Extra-work line items, in sheet order
    pub extra_items: Vec<LineItem>,
}

/// Title and agreement metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleMeta {
    pub project_name: Option<String>,
    /// Contractor / executing agency
    pub agency: Option<String>,
    pub agreement_no: Option<String>,
    pub work_order_no: Option<String>,
    /// Serial of this bill (e.g. "First & Final")
    pub bill_number: Option<String>,
    pub start_date: Option<String>,
    pub scheduled_completion: Option<String>,
    pub actual_completion: Option<String>,
    pub measurement_date: Option<String>,
    /// Amount paid through the previous running bill
    pub amount_paid_last_bill: Option<f64>,
    /// Free-form fields usable as template placeholders
    pub extra: BTreeMap<String, String>,
}

/// Which schedule a line item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    WorkOrder,
    ExtraItem,
}

/// One measured line of a schedule
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub item_no: String,
    pub description: String,
    pub unit: Option<String>,
    /// Quantity executed since the last certificate
    pub qty_since_last: f64,
    /// Quantity executed up to date
    pub qty_to_date: f64,
    /// Quantity sanctioned in the work order
    pub qty_work_order: Option<f64>,
    pub rate: Option<f64>,
}

impl BillingDataset {
    /// Check numeric fields are finite
    pub fn validate(&self) -> Result<()> {
        for item in self.work_order.iter().chain(&self.extra_items) {
            item.validate()?;
        }
        if let Some(paid) = self.title.amount_paid_last_bill {
            if !paid.is_finite() {
                return Err(DataError::InvalidValue {
                    item: "title".to_string(),
                    field: "amount_paid_last_bill",
                    value: paid,
                });
            }
        }
        Ok(())
    }

    /// Items of one schedule
    pub fn items(&self, kind: ItemKind) -> &[LineItem] {
        match kind {
            ItemKind::WorkOrder => &self.work_order,
            ItemKind::ExtraItem => &self.extra_items,
        }
    }

    /// Sum of up-to-date amounts of one schedule
    pub fn total_to_date(&self, kind: ItemKind) -> f64 {
        self.items(kind)
            .iter()
            .filter_map(LineItem::amount_to_date)
            .sum()
    }

    /// Sum of since-last-certificate amounts of one schedule
    pub fn total_since_last(&self, kind: ItemKind) -> f64 {
        self.items(kind)
            .iter()
            .filter_map(LineItem::amount_since_last)
            .sum()
    }

    /// Sanctioned work-order value
    pub fn work_order_value(&self) -> f64 {
        self.work_order
            .iter()
            .filter_map(LineItem::amount_work_order)
            .sum()
    }

    /// Work-order plus extra items, up to date
    pub fn gross_to_date(&self) -> f64 {
        self.total_to_date(ItemKind::WorkOrder) + self.total_to_date(ItemKind::ExtraItem)
    }

    /// Gross value less what the previous bill already paid
    pub fn payable_now(&self) -> f64 {
        self.gross_to_date() - self.title.amount_paid_last_bill.unwrap_or(0.0)
    }
}

impl TitleMeta {
    /// Look up a field by name, including `extra` entries
    ///
    /// Blank values count as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "project_name" => self.project_name.as_deref(),
            "agency" => self.agency.as_deref(),
            "agreement_no" => self.agreement_no.as_deref(),
            "work_order_no" => self.work_order_no.as_deref(),
            "bill_number" => self.bill_number.as_deref(),
            "start_date" => self.start_date.as_deref(),
            "scheduled_completion" => self.scheduled_completion.as_deref(),
            "actual_completion" => self.actual_completion.as_deref(),
            "measurement_date" => self.measurement_date.as_deref(),
            other => self.extra.get(other).map(String::as_str),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

impl LineItem {
    /// Shorthand used by tests and fixtures
    pub fn new(item_no: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            item_no: item_no.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_quantities(mut self, since_last: f64, to_date: f64) -> Self {
        self.qty_since_last = since_last;
        self.qty_to_date = to_date;
        self
    }

    pub fn with_work_order_qty(mut self, qty: f64) -> Self {
        self.qty_work_order = Some(qty);
        self
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = Some(rate);
        self
    }

    fn validate(&self) -> Result<()> {
        let numbers = [
            ("qty_since_last", Some(self.qty_since_last)),
            ("qty_to_date", Some(self.qty_to_date)),
            ("qty_work_order", self.qty_work_order),
            ("rate", self.rate),
        ];
        for (field, value) in numbers {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(DataError::InvalidValue {
                        item: self.item_no.clone(),
                        field,
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Rate, if present and non-zero
    ///
    /// Rows without a billable rate populate only item number and
    /// description; every derived value below is `None` for them.
    pub fn billable_rate(&self) -> Option<f64> {
        self.rate.filter(|r| *r != 0.0)
    }

    /// Whether derived amounts exist for this row
    pub fn is_priced(&self) -> bool {
        self.billable_rate().is_some()
    }

    pub fn amount_since_last(&self) -> Option<f64> {
        self.billable_rate().map(|r| self.qty_since_last * r)
    }

    pub fn amount_to_date(&self) -> Option<f64> {
        self.billable_rate().map(|r| self.qty_to_date * r)
    }

    pub fn amount_work_order(&self) -> Option<f64> {
        self.billable_rate()
            .map(|r| self.qty_work_order.unwrap_or(0.0) * r)
    }

    /// Executed quantity above the work-order quantity
    pub fn excess_qty(&self) -> Option<f64> {
        self.billable_rate()?;
        Some((self.qty_to_date - self.qty_work_order.unwrap_or(0.0)).max(0.0))
    }

    /// Work-order quantity left unexecuted
    pub fn saving_qty(&self) -> Option<f64> {
        self.billable_rate()?;
        Some((self.qty_work_order.unwrap_or(0.0) - self.qty_to_date).max(0.0))
    }

    pub fn excess_amount(&self) -> Option<f64> {
        Some(self.excess_qty()? * self.billable_rate()?)
    }

    pub fn saving_amount(&self) -> Option<f64> {
        Some(self.saving_qty()? * self.billable_rate()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpriced_rows_have_no_amounts() {
        for item in [
            LineItem::new("1", "Heading row").with_quantities(2.0, 5.0),
            LineItem::new("2", "Zero rate")
                .with_quantities(2.0, 5.0)
                .with_rate(0.0),
        ] {
            assert!(!item.is_priced());
            assert_eq!(item.amount_since_last(), None);
            assert_eq!(item.amount_to_date(), None);
            assert_eq!(item.amount_work_order(), None);
            assert_eq!(item.excess_qty(), None);
            assert_eq!(item.saving_amount(), None);
        }
    }

    #[test]
    fn test_priced_row_amounts() {
        let item = LineItem::new("3", "Brick work")
            .with_unit("cum")
            .with_quantities(1.5, 4.0)
            .with_work_order_qty(3.0)
            .with_rate(250.0);
        assert_eq!(item.amount_since_last(), Some(375.0));
        assert_eq!(item.amount_to_date(), Some(1000.0));
        assert_eq!(item.amount_work_order(), Some(750.0));
        assert_eq!(item.excess_qty(), Some(1.0));
        assert_eq!(item.saving_qty(), Some(0.0));
        assert_eq!(item.excess_amount(), Some(250.0));
    }

    #[test]
    fn test_dataset_totals() {
        let dataset = BillingDataset {
            title: TitleMeta {
                amount_paid_last_bill: Some(100.0),
                ..Default::default()
            },
            work_order: vec![
                LineItem::new("1", "A").with_quantities(1.0, 2.0).with_rate(10.0),
                LineItem::new("2", "B").with_quantities(1.0, 2.0),
            ],
            extra_items: vec![LineItem::new("E1", "C").with_quantities(0.0, 3.0).with_rate(100.0)],
        };
        assert_eq!(dataset.total_to_date(ItemKind::WorkOrder), 20.0);
        assert_eq!(dataset.total_since_last(ItemKind::WorkOrder), 10.0);
        assert_eq!(dataset.gross_to_date(), 320.0);
        assert_eq!(dataset.payable_now(), 220.0);
    }

    #[test]
    fn test_title_field_lookup() {
        let mut title = TitleMeta {
            project_name: Some("Road repair".to_string()),
            agency: Some("   ".to_string()),
            ..Default::default()
        };
        title.extra.insert("division".to_string(), "North".to_string());
        assert_eq!(title.field("project_name"), Some("Road repair"));
        assert_eq!(title.field("agency"), None);
        assert_eq!(title.field("division"), Some("North"));
        assert_eq!(title.field("nope"), None);
    }

    #[test]
    fn test_validate_rejects_nan() {
        let dataset = BillingDataset {
            work_order: vec![LineItem::new("9", "Bad").with_rate(f64::NAN)],
            ..Default::default()
        };
        assert!(matches!(
            dataset.validate(),
            Err(DataError::InvalidValue { field: "rate", .. })
        ));
    }
}
