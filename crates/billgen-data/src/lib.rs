//! # billgen-data
//!
//! Billing dataset model for billgen.
//!
//! ## Features
//!
//! - **Model**: work-order and extra-work line items plus title metadata
//! - **Amounts**: derived amounts honouring zero-rate suppression
//! - **Hashing**: stable content hash used in conversion cache keys
//! - **Loading**: JSON and TOML dataset files
//!
//! ## Example
//!
//! ```rust,ignore
//! use billgen_data::{load_dataset, ItemKind};
//!
//! let dataset = load_dataset("bill-07.json")?;
//! println!("{}", dataset.total_to_date(ItemKind::WorkOrder));
//! println!("{}", dataset.content_hash());
//! ```

pub mod error;
pub mod format;
pub mod hash;
pub mod model;
pub mod sources;

// Re-exports
pub use error::{DataError, Result};
pub use format::{amount_in_words, format_amount, format_percent, format_quantity};
pub use hash::sha256_tagged;
pub use model::{BillingDataset, ItemKind, LineItem, TitleMeta};
pub use sources::{is_dataset_file, load_dataset, source_for, DatasetSource, JsonSource, TomlSource};
