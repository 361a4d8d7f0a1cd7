//! Quality validation of backend output
//!
//! A backend reporting success is not enough: truncated or near-empty
//! output is rejected so the chain can fall through to the next backend.

use serde::{Deserialize, Serialize};

use crate::types::MediaKind;

const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_TRAILER: &[u8] = b"%%EOF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Outcome of validating one output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail(String),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Size thresholds and structural checks per media kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityPolicy {
    /// When false, any non-empty output passes
    pub enabled: bool,
    pub min_markup_bytes: usize,
    pub min_paginated_bytes: usize,
    pub min_word_bytes: usize,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_markup_bytes: 200,
            min_paginated_bytes: 800,
            min_word_bytes: 1000,
        }
    }
}

impl QualityPolicy {
    /// Policy that only rejects empty output
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Minimum accepted size for a media kind
    pub fn min_bytes(&self, kind: MediaKind) -> usize {
        match kind {
            MediaKind::Markup => self.min_markup_bytes,
            MediaKind::Paginated => self.min_paginated_bytes,
            MediaKind::WordProcessor => self.min_word_bytes,
        }
    }

    /// Validate output bytes for a media kind
    pub fn check(&self, kind: MediaKind, data: &[u8]) -> Verdict {
        if data.is_empty() {
            return Verdict::Fail("empty output".to_string());
        }
        if !self.enabled {
            return Verdict::Pass;
        }

        let min = self.min_bytes(kind);
        if data.len() < min {
            return Verdict::Fail(format!(
                "output of {} bytes is below the {} byte minimum for {}",
                data.len(),
                min,
                kind
            ));
        }

        match structural_check(kind, data) {
            Ok(()) => Verdict::Pass,
            Err(reason) => Verdict::Fail(reason),
        }
    }
}

fn structural_check(kind: MediaKind, data: &[u8]) -> Result<(), String> {
    match kind {
        MediaKind::Paginated => {
            if !data.starts_with(PDF_MAGIC) {
                return Err("missing %PDF- header".to_string());
            }
            let tail_start = data.len().saturating_sub(1024);
            if !contains(&data[tail_start..], PDF_TRAILER) {
                return Err("missing %%EOF trailer".to_string());
            }
            Ok(())
        }
        MediaKind::WordProcessor => {
            if data.starts_with(ZIP_MAGIC) {
                Ok(())
            } else {
                Err("not a ZIP package".to_string())
            }
        }
        MediaKind::Markup => {
            let head = String::from_utf8_lossy(&data[..data.len().min(256)]);
            let head = head.trim_start_matches('\u{feff}').trim_start().to_lowercase();
            if head.starts_with("<!doctype html") || head.starts_with("<html") {
                Ok(())
            } else {
                Err("missing HTML doctype".to_string())
            }
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
