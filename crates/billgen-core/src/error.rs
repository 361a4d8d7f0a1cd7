//! Error types for rendering, assembly and batch setup

use std::path::PathBuf;

use billgen_engine::EngineConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::LogicalDocument;

/// Errors that stop one logical document from being rendered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// No template directory holds `<document-id>.toml`
    #[error("Template missing for {document}")]
    TemplateMissing { document: LogicalDocument },

    /// A template file exists but cannot be used
    #[error("Invalid template {}: {message}", path.display())]
    TemplateInvalid { path: PathBuf, message: String },

    /// A field the document needs is absent or blank
    #[error("{document} requires field '{field}'")]
    DataShapeError {
        document: LogicalDocument,
        field: String,
    },
}

/// Batch-level errors, raised before any job starts
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid settings, template directories or output root
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend chains cannot be built from the settings
    #[error("Configuration error: {0}")]
    Engine(#[from] EngineConfigError),

    /// Settings file could not be parsed
    #[error("Invalid settings {path}: {source}")]
    Settings {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether this is one of the configuration errors that abort a batch
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CoreError::Configuration(_) | CoreError::Engine(_) | CoreError::Settings { .. }
        )
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Category of an error recorded in a job report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Input file could not be loaded
    Dataset,
    TemplateMissing,
    TemplateInvalid,
    DataShape,
    ConversionExhausted,
    /// Combined PDF could not be built
    Merge,
    /// Output file or archive could not be written
    Output,
}

impl RenderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            RenderError::TemplateMissing { .. } => ErrorClass::TemplateMissing,
            RenderError::TemplateInvalid { .. } => ErrorClass::TemplateInvalid,
            RenderError::DataShapeError { .. } => ErrorClass::DataShape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billgen_engine::MediaKind;

    #[test]
    fn test_render_error_messages() {
        let err = RenderError::DataShapeError {
            document: LogicalDocument::CertificateII,
            field: "bill_number".to_string(),
        };
        assert_eq!(err.to_string(), "Certificate II requires field 'bill_number'");
        assert_eq!(err.class(), ErrorClass::DataShape);

        let err = RenderError::TemplateMissing {
            document: LogicalDocument::Summary,
        };
        assert_eq!(err.class(), ErrorClass::TemplateMissing);
    }

    #[test]
    fn test_configuration_classification() {
        assert!(CoreError::Configuration("no workers".into()).is_configuration());
        assert!(CoreError::Engine(EngineConfigError::EmptyOrder(MediaKind::Markup)).is_configuration());
        assert!(!CoreError::Io(std::io::Error::other("disk")).is_configuration());
    }
}
