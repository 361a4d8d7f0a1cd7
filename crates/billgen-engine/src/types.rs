//! Media kinds produced for every logical document

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Output format family of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// HTML markup
    Markup,
    /// Paginated document (PDF)
    Paginated,
    /// Word-processor document (DOCX)
    #[serde(rename = "word")]
    WordProcessor,
}

impl MediaKind {
    /// Every media kind, in output order
    pub fn all() -> &'static [MediaKind] {
        &[
            MediaKind::Markup,
            MediaKind::Paginated,
            MediaKind::WordProcessor,
        ]
    }

    /// Identifier used in configuration files
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Paginated => "paginated",
            Self::WordProcessor => "word",
        }
    }

    /// File extension of outputs of this kind
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Markup => "html",
            Self::Paginated => "pdf",
            Self::WordProcessor => "docx",
        }
    }

    /// Name of the output sub-collection holding this kind
    pub fn collection(&self) -> &'static str {
        self.extension()
    }

    /// MIME type of outputs of this kind
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Markup => "text/html",
            Self::Paginated => "application/pdf",
            Self::WordProcessor => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.config_key())
    }
}

/// Error returned when parsing an unknown media kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown media kind: {0}")]
pub struct UnknownMediaKind(pub String);

impl FromStr for MediaKind {
    type Err = UnknownMediaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markup" | "html" => Ok(Self::Markup),
            "paginated" | "pdf" => Ok(Self::Paginated),
            "word" | "word-processor" | "docx" => Ok(Self::WordProcessor),
            _ => Err(UnknownMediaKind(s.to_string())),
        }
    }
}
