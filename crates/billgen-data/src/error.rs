//! Error types for dataset loading.

use thiserror::Error;

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading a billing dataset
#[derive(Debug, Error)]
pub enum DataError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File extension has no registered loader
    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    /// JSON dataset could not be decoded
    #[error("Invalid JSON dataset {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// TOML dataset could not be decoded
    #[error("Invalid TOML dataset {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A numeric field holds a value that cannot be billed
    #[error("Invalid value for {field} on item {item}: {value}")]
    InvalidValue {
        item: String,
        field: &'static str,
        value: f64,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
