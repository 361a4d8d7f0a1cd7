//! Integration tests for billgen-data

use std::fs;

use billgen_data::{is_dataset_file, load_dataset, DataError, ItemKind};
use tempfile::TempDir;

const JSON_DATASET: &str = r#"{
  "title": {
    "project_name": "Repair of PHC building",
    "agency": "M/s Sharma Builders",
    "agreement_no": "48/2025-26",
    "amount_paid_last_bill": 1000.0,
    "extra": { "division": "PWD Division II" }
  },
  "work_order": [
    { "item_no": "1", "description": "Earth work", "unit": "cum",
      "qty_since_last": 2.0, "qty_to_date": 10.0, "qty_work_order": 12.0, "rate": 150.0 },
    { "item_no": "2", "description": "Sub-head: Masonry" }
  ],
  "extra_items": [
    { "item_no": "E1", "description": "Anti-termite treatment", "unit": "sqm",
      "qty_to_date": 20.0, "rate": 25.5 }
  ]
}"#;

const TOML_DATASET: &str = r#"
[title]
project_name = "Boundary wall"
agency = "M/s Verma & Sons"

[[work_order]]
item_no = "1.1"
description = "Plaster 12mm"
unit = "sqm"
qty_since_last = 4.0
qty_to_date = 4.0
rate = 210.0
"#;

#[test]
fn test_load_json_dataset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bill.json");
    fs::write(&path, JSON_DATASET).unwrap();

    let dataset = load_dataset(&path).expect("dataset should load");
    assert_eq!(dataset.work_order.len(), 2);
    assert_eq!(dataset.extra_items.len(), 1);
    assert_eq!(dataset.title.field("division"), Some("PWD Division II"));
    assert!(!dataset.work_order[1].is_priced());
    assert_eq!(dataset.total_to_date(ItemKind::WorkOrder), 1500.0);
    assert_eq!(dataset.total_to_date(ItemKind::ExtraItem), 510.0);
    assert_eq!(dataset.payable_now(), 1010.0);
}

#[test]
fn test_load_toml_dataset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bill.toml");
    fs::write(&path, TOML_DATASET).unwrap();

    let dataset = load_dataset(&path).expect("dataset should load");
    assert_eq!(dataset.title.field("agency"), Some("M/s Verma & Sons"));
    assert!(dataset.extra_items.is_empty());
    assert_eq!(dataset.work_order[0].amount_to_date(), Some(840.0));
}

const JSON_EQUIVALENT: &str = r#"{
  "title": { "project_name": "Boundary wall", "agency": "M/s Verma & Sons" },
  "work_order": [
    { "item_no": "1.1", "description": "Plaster 12mm", "unit": "sqm",
      "qty_since_last": 4.0, "qty_to_date": 4.0, "rate": 210.0 }
  ]
}"#;

#[test]
fn test_same_content_same_hash_across_formats() {
    let dir = TempDir::new().unwrap();
    let toml_path = dir.path().join("a.toml");
    let json_path = dir.path().join("a.json");
    fs::write(&toml_path, TOML_DATASET).unwrap();
    fs::write(&json_path, JSON_EQUIVALENT).unwrap();

    let from_toml = load_dataset(&toml_path).unwrap();
    let from_json = load_dataset(&json_path).unwrap();
    assert_eq!(from_toml, from_json);
    assert_eq!(from_toml.content_hash(), from_json.content_hash());
}

#[test]
fn test_missing_file() {
    let result = load_dataset("/nonexistent/bill.json");
    assert!(matches!(result, Err(DataError::FileNotFound(_))));
}

#[test]
fn test_unsupported_extension() {
    let result = load_dataset("bill.xlsx");
    assert!(matches!(result, Err(DataError::UnsupportedFormat(_))));
    assert!(!is_dataset_file(std::path::Path::new("bill.xlsx")));
    assert!(is_dataset_file(std::path::Path::new("BILL.JSON")));
}

#[test]
fn test_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(load_dataset(&path), Err(DataError::Json { .. })));
}
