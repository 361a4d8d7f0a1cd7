//! Document templates
//!
//! A template is a small TOML file named after the document id
//! (`summary.toml`, `certificate_ii.toml`, ...). It supplies the heading,
//! free text above and below the main table, and table column labels
//! and weights. Text lines may reference dataset fields as `{field}`.
//!
//! [`TemplateRegistry`] searches the configured directories in order and
//! falls back to the templates compiled into the crate.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use billgen_data::sha256_tagged;
use serde::{Deserialize, Serialize};

use crate::config::TemplateSettings;
use crate::document::LogicalDocument;
use crate::error::{CoreError, RenderError, Result};

const BUILTIN: [(LogicalDocument, &str); 6] = [
    (
        LogicalDocument::Summary,
        include_str!("../templates/summary.toml"),
    ),
    (
        LogicalDocument::DeviationStatement,
        include_str!("../templates/deviation_statement.toml"),
    ),
    (
        LogicalDocument::ExtraItems,
        include_str!("../templates/extra_items.toml"),
    ),
    (
        LogicalDocument::CertificateI,
        include_str!("../templates/certificate_i.toml"),
    ),
    (
        LogicalDocument::CertificateII,
        include_str!("../templates/certificate_ii.toml"),
    ),
    (
        LogicalDocument::ScrutinySheet,
        include_str!("../templates/scrutiny_sheet.toml"),
    ),
];

/// Parsed template file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Template {
    /// Heading text; the document title when absent
    pub title: Option<String>,
    pub landscape: bool,
    /// Lines above the main table
    pub preamble: Vec<String>,
    /// Lines below the main table
    pub footer: Vec<String>,
    /// Overrides the default header labels of the main table
    pub column_labels: Vec<String>,
    /// Relative column widths of the main table
    pub column_widths: Vec<u32>,
    /// Dataset fields that must be present, beyond those the document needs
    pub required: Vec<String>,
}

impl Template {
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Field names referenced by `{field}` placeholders, in order of appearance
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        for line in self.preamble.iter().chain(&self.footer) {
            for segment in parse_line(line) {
                if let Segment::Field(name) = segment {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
        names
    }
}

/// Piece of a template line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Field(&'a str),
}

/// Split a line into literal text and `{field}` references
///
/// `{{` and `}}` stand for literal braces. An unterminated `{` is kept
/// as literal text.
pub fn parse_line(line: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = line;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("{{") {
            segments.push(Segment::Literal("{"));
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix("}}") {
            segments.push(Segment::Literal("}"));
            rest = after;
            continue;
        }
        if let Some(after) = rest.strip_prefix('{') {
            if let Some(end) = after.find('}') {
                let name = after[..end].trim();
                if !name.is_empty() && !name.contains('{') {
                    segments.push(Segment::Field(name));
                    rest = &after[end + 1..];
                    continue;
                }
            }
            segments.push(Segment::Literal("{"));
            rest = after;
            continue;
        }
        let end = rest.find(['{', '}']).map(|i| i.max(1)).unwrap_or(rest.len());
        segments.push(Segment::Literal(&rest[..end]));
        rest = &rest[end..];
    }
    segments
}

/// Where a resolved template came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    File(PathBuf),
    Builtin,
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::File(path) => write!(f, "{}", path.display()),
            TemplateSource::Builtin => f.write_str("built-in"),
        }
    }
}

/// Template resolved for one logical document
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTemplate {
    pub document: LogicalDocument,
    pub source: TemplateSource,
    /// `sha256:<hex>` of the template bytes; part of every cache key
    pub version: String,
    pub template: Template,
}

/// Ordered template lookup
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    dirs: Vec<PathBuf>,
    builtin: bool,
}

impl TemplateRegistry {
    /// Create a registry, checking the configured directories
    ///
    /// Fails when no source is configured at all or when a listed
    /// directory does not exist.
    pub fn new(settings: &TemplateSettings) -> Result<Self> {
        if settings.dirs.is_empty() && !settings.builtin {
            return Err(CoreError::Configuration(
                "no template directories configured and built-in templates disabled".to_string(),
            ));
        }
        for dir in &settings.dirs {
            if !dir.is_dir() {
                return Err(CoreError::Configuration(format!(
                    "template directory not found: {}",
                    dir.display()
                )));
            }
        }
        Ok(Self {
            dirs: settings.dirs.clone(),
            builtin: settings.builtin,
        })
    }

    /// Registry that only serves the built-in templates
    pub fn builtin() -> Self {
        Self {
            dirs: Vec::new(),
            builtin: true,
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Find the template for a document
    pub fn resolve(
        &self,
        document: LogicalDocument,
    ) -> std::result::Result<ResolvedTemplate, RenderError> {
        let file_name = format!("{}.toml", document.id());
        for dir in &self.dirs {
            let path = dir.join(&file_name);
            if path.is_file() {
                return load_file(document, &path);
            }
        }

        if self.builtin {
            if let Some(text) = builtin_text(document) {
                let template =
                    Template::from_toml_str(text).map_err(|e| RenderError::TemplateInvalid {
                        path: PathBuf::from(file_name),
                        message: e.to_string(),
                    })?;
                return Ok(ResolvedTemplate {
                    document,
                    source: TemplateSource::Builtin,
                    version: sha256_tagged(text.as_bytes()),
                    template,
                });
            }
        }

        Err(RenderError::TemplateMissing { document })
    }
}

fn load_file(
    document: LogicalDocument,
    path: &Path,
) -> std::result::Result<ResolvedTemplate, RenderError> {
    let invalid = |message: String| RenderError::TemplateInvalid {
        path: path.to_path_buf(),
        message,
    };
    let bytes = fs::read(path).map_err(|e| invalid(e.to_string()))?;
    let text = std::str::from_utf8(&bytes).map_err(|e| invalid(e.to_string()))?;
    let template = Template::from_toml_str(text).map_err(|e| invalid(e.to_string()))?;
    Ok(ResolvedTemplate {
        document,
        source: TemplateSource::File(path.to_path_buf()),
        version: sha256_tagged(&bytes),
        template,
    })
}

/// Source text of the compiled-in template for a document
pub fn builtin_text(document: LogicalDocument) -> Option<&'static str> {
    BUILTIN
        .iter()
        .find(|(doc, _)| *doc == document)
        .map(|(_, text)| *text)
}

/// Write the built-in templates into `dir`
///
/// Existing files are left alone unless `overwrite` is set. Returns the
/// paths actually written.
pub fn write_defaults(dir: &Path, overwrite: bool) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (document, text) in BUILTIN {
        let path = dir.join(format!("{}.toml", document.id()));
        if path.exists() && !overwrite {
            continue;
        }
        fs::write(&path, text)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtins_parse() {
        for document in LogicalDocument::ALL {
            let text = builtin_text(document).unwrap();
            let template = Template::from_toml_str(text)
                .unwrap_or_else(|e| panic!("{} template invalid: {}", document.id(), e));
            assert_eq!(
                template.column_labels.len(),
                template.column_widths.len(),
                "{}",
                document.id()
            );
        }
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("Work: {project_name}, bill {bill_number}"),
            vec![
                Segment::Literal("Work: "),
                Segment::Field("project_name"),
                Segment::Literal(", bill "),
                Segment::Field("bill_number"),
            ]
        );
        assert_eq!(
            parse_line("{{literal}} {"),
            vec![
                Segment::Literal("{"),
                Segment::Literal("literal"),
                Segment::Literal("}"),
                Segment::Literal(" "),
                Segment::Literal("{"),
            ]
        );
    }

    #[test]
    fn test_placeholders() {
        let template = Template {
            preamble: vec!["{agency} / {project_name}".to_string()],
            footer: vec!["{agency}".to_string()],
            ..Default::default()
        };
        assert_eq!(template.placeholders(), vec!["agency", "project_name"]);
    }

    #[test]
    fn test_registry_requires_a_source() {
        let settings = TemplateSettings {
            dirs: Vec::new(),
            builtin: false,
        };
        assert!(matches!(
            TemplateRegistry::new(&settings),
            Err(CoreError::Configuration(_))
        ));

        let settings = TemplateSettings {
            dirs: vec![PathBuf::from("/nonexistent/templates")],
            builtin: true,
        };
        assert!(TemplateRegistry::new(&settings).is_err());
    }

    #[test]
    fn test_first_directory_wins() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::write(first.path().join("summary.toml"), "title = \"First\"\n").unwrap();
        fs::write(second.path().join("summary.toml"), "title = \"Second\"\n").unwrap();
        fs::write(second.path().join("extra_items.toml"), "title = \"Extras\"\n").unwrap();

        let registry = TemplateRegistry::new(&TemplateSettings {
            dirs: vec![first.path().to_path_buf(), second.path().to_path_buf()],
            builtin: false,
        })
        .unwrap();

        let summary = registry.resolve(LogicalDocument::Summary).unwrap();
        assert_eq!(summary.template.title.as_deref(), Some("First"));
        assert_eq!(
            summary.source,
            TemplateSource::File(first.path().join("summary.toml"))
        );

        let extras = registry.resolve(LogicalDocument::ExtraItems).unwrap();
        assert_eq!(extras.template.title.as_deref(), Some("Extras"));

        assert_eq!(
            registry.resolve(LogicalDocument::ScrutinySheet),
            Err(RenderError::TemplateMissing {
                document: LogicalDocument::ScrutinySheet
            })
        );
    }

    #[test]
    fn test_builtin_fallback_and_version() {
        let registry = TemplateRegistry::builtin();
        let resolved = registry.resolve(LogicalDocument::CertificateI).unwrap();
        assert_eq!(resolved.source, TemplateSource::Builtin);
        assert!(resolved.version.starts_with("sha256:"));

        // Written defaults resolve to the same version
        let dir = TempDir::new().unwrap();
        write_defaults(dir.path(), false).unwrap();
        let from_dir = TemplateRegistry::new(&TemplateSettings {
            dirs: vec![dir.path().to_path_buf()],
            builtin: false,
        })
        .unwrap()
        .resolve(LogicalDocument::CertificateI)
        .unwrap();
        assert_eq!(from_dir.version, resolved.version);
        assert_eq!(from_dir.template, resolved.template);
    }

    #[test]
    fn test_edit_changes_version() {
        let dir = TempDir::new().unwrap();
        let settings = TemplateSettings {
            dirs: vec![dir.path().to_path_buf()],
            builtin: false,
        };
        let path = dir.path().join("summary.toml");
        fs::write(&path, "title = \"A\"\n").unwrap();
        let registry = TemplateRegistry::new(&settings).unwrap();
        let before = registry.resolve(LogicalDocument::Summary).unwrap().version;
        fs::write(&path, "title = \"B\"\n").unwrap();
        let after = registry.resolve(LogicalDocument::Summary).unwrap().version;
        assert_ne!(before, after);
    }

    #[test]
    fn test_invalid_template_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("summary.toml"), "landscape = \"yes\"\n").unwrap();
        let registry = TemplateRegistry::new(&TemplateSettings {
            dirs: vec![dir.path().to_path_buf()],
            builtin: true,
        })
        .unwrap();
        assert!(matches!(
            registry.resolve(LogicalDocument::Summary),
            Err(RenderError::TemplateInvalid { .. })
        ));
    }

    #[test]
    fn test_write_defaults_keeps_existing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("summary.toml"), "title = \"Mine\"\n").unwrap();
        let written = write_defaults(dir.path(), false).unwrap();
        assert_eq!(written.len(), 5);
        let kept = fs::read_to_string(dir.path().join("summary.toml")).unwrap();
        assert_eq!(kept, "title = \"Mine\"\n");

        let written = write_defaults(dir.path(), true).unwrap();
        assert_eq!(written.len(), 6);
    }
}
