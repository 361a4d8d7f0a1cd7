//! The fixed set of documents produced for every bill

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One document type of a bill
///
/// Declaration order is the canonical order used for the combined PDF
/// and for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalDocument {
    Summary,
    DeviationStatement,
    ExtraItems,
    CertificateI,
    #[serde(rename = "certificate_ii")]
    CertificateII,
    ScrutinySheet,
}

/// Name of the merged PDF inside the `pdf` collection
pub const COMBINED_TITLE: &str = "Combined Bill";

impl LogicalDocument {
    /// All documents in canonical order
    pub const ALL: [LogicalDocument; 6] = [
        LogicalDocument::Summary,
        LogicalDocument::DeviationStatement,
        LogicalDocument::ExtraItems,
        LogicalDocument::CertificateI,
        LogicalDocument::CertificateII,
        LogicalDocument::ScrutinySheet,
    ];

    /// Stable identifier, also the template file stem
    pub fn id(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::DeviationStatement => "deviation_statement",
            Self::ExtraItems => "extra_items",
            Self::CertificateI => "certificate_i",
            Self::CertificateII => "certificate_ii",
            Self::ScrutinySheet => "scrutiny_sheet",
        }
    }

    /// Human-readable title, used for output file names
    pub fn title(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::DeviationStatement => "Deviation Statement",
            Self::ExtraItems => "Extra Items",
            Self::CertificateI => "Certificate I",
            Self::CertificateII => "Certificate II",
            Self::ScrutinySheet => "Scrutiny Sheet",
        }
    }

    /// Position in the canonical order
    pub fn position(&self) -> usize {
        Self::ALL.iter().position(|d| d == self).unwrap_or(0)
    }
}

impl fmt::Display for LogicalDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Error returned when parsing an unknown document id
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown document: {0}")]
pub struct UnknownDocument(pub String);

impl FromStr for LogicalDocument {
    type Err = UnknownDocument;

    /// Accepts the id or the title, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.id().eq_ignore_ascii_case(wanted) || d.title().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownDocument(s.to_string()))
    }
}
