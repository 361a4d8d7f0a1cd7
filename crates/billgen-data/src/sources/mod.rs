//! Dataset sources.
//!
//! Spreadsheet extraction happens upstream; billgen reads the resulting
//! dataset files, either JSON or TOML with the same field names.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};
use crate::model::BillingDataset;

/// Something that can produce a billing dataset
pub trait DatasetSource {
    /// Load and validate the dataset
    fn load(&self) -> Result<BillingDataset>;

    /// Human-readable origin, used in reports
    fn describe(&self) -> String;
}

/// Dataset stored as JSON
pub struct JsonSource {
    path: PathBuf,
}

/// Dataset stored as TOML
pub struct TomlSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TomlSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for JsonSource {
    fn load(&self) -> Result<BillingDataset> {
        let text = read_existing(&self.path)?;
        let dataset: BillingDataset =
            serde_json::from_str(&text).map_err(|source| DataError::Json {
                path: self.path.display().to_string(),
                source,
            })?;
        dataset.validate()?;
        Ok(dataset)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl DatasetSource for TomlSource {
    fn load(&self) -> Result<BillingDataset> {
        let text = read_existing(&self.path)?;
        let dataset: BillingDataset = toml::from_str(&text).map_err(|source| DataError::Toml {
            path: self.path.display().to_string(),
            source,
        })?;
        dataset.validate()?;
        Ok(dataset)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn read_existing(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(DataError::FileNotFound(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Pick a source for a path from its extension
pub fn source_for(path: &Path) -> Result<Box<dyn DatasetSource>> {
    match extension_of(path).as_deref() {
        Some("json") => Ok(Box::new(JsonSource::new(path))),
        Some("toml") => Ok(Box::new(TomlSource::new(path))),
        _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load a dataset file, dispatching on its extension
pub fn load_dataset(path: impl AsRef<Path>) -> Result<BillingDataset> {
    source_for(path.as_ref())?.load()
}

/// Whether a path looks like a dataset file
pub fn is_dataset_file(path: &Path) -> bool {
    matches!(extension_of(path).as_deref(), Some("json") | Some("toml"))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
