//! Configuration settings
//!
//! Settings are read from `billgen.toml`:
//!
//! ```toml
//! [engines]
//! markup = ["html"]
//! paginated = ["typst", "command", "simple"]
//! word = ["docx"]
//!
//! [engines.command]
//! program = "wkhtmltopdf"
//! args = ["--quiet", "{input}", "{output}"]
//! deadline_secs = 60
//!
//! [quality]
//! min_paginated_bytes = 800
//!
//! [cache]
//! capacity = 256
//!
//! [workers]
//! ceiling = 8
//!
//! [templates]
//! dirs = ["templates"]
//! ```
//!
//! Every section and field is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use billgen_engine::{MediaKind, QualityPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// File looked up in the working directory when no config is given
pub const DEFAULT_CONFIG_FILE: &str = "billgen.toml";

/// Upper bound on worker threads regardless of configuration
pub const HARD_MAX_WORKERS: usize = 64;

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub engines: EngineSettings,
    pub quality: QualityPolicy,
    pub cache: CacheSettings,
    pub workers: WorkerSettings,
    pub templates: TemplateSettings,
    pub backend: BackendSettings,
}

/// Backend order per media kind plus per-backend options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub markup: Vec<String>,
    pub paginated: Vec<String>,
    pub word: Vec<String>,
    pub command: CommandSettings,
    pub typst: TypstSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            markup: vec!["html".to_string()],
            paginated: vec![
                "typst".to_string(),
                "command".to_string(),
                "simple".to_string(),
            ],
            word: vec!["docx".to_string()],
            command: CommandSettings::default(),
            typst: TypstSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Configured order for one media kind
    pub fn order(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Markup => &self.markup,
            MediaKind::Paginated => &self.paginated,
            MediaKind::WordProcessor => &self.word,
        }
    }
}

/// External HTML-to-PDF converter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub program: String,
    /// `{input}` and `{output}` are replaced with file paths
    pub args: Vec<String>,
    pub deadline_secs: u64,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            program: "wkhtmltopdf".to_string(),
            args: vec![
                "--quiet".to_string(),
                "{input}".to_string(),
                "{output}".to_string(),
            ],
            deadline_secs: 60,
        }
    }
}

/// Typst typesetting options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TypstSettings {
    /// Extra font files loaded into every compilation
    pub fonts: Vec<PathBuf>,
}

/// Conversion cache sizing and reclaim cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum number of cached conversion results
    pub capacity: usize,
    /// Run a reclaim pass after this many completed jobs (0 disables)
    pub reclaim_every: usize,
    /// Entries kept by a reclaim pass
    pub reclaim_retain: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 256,
            reclaim_every: 10,
            reclaim_retain: 64,
        }
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Most workers a batch may use; further capped at [`HARD_MAX_WORKERS`]
    pub ceiling: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self { ceiling: 8 }
    }
}

impl WorkerSettings {
    /// Worker count for a batch
    ///
    /// An explicit request wins; otherwise the host's available
    /// parallelism. Either way the result is clamped to the ceiling and
    /// to [`HARD_MAX_WORKERS`].
    pub fn effective(&self, requested: Option<usize>) -> usize {
        let wanted = requested.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        wanted.clamp(1, self.ceiling.clamp(1, HARD_MAX_WORKERS))
    }
}

/// Where templates are looked up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Searched in order; first directory holding `<id>.toml` wins
    pub dirs: Vec<PathBuf>,
    /// Fall back to the templates compiled into the binary
    pub builtin: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            builtin: true,
        }
    }
}

/// Limits applied to every backend invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Read and parse a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CoreError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content).map_err(|source| CoreError::Settings {
            path: path.display().to_string(),
            source,
        })
    }

    /// Settings from an explicit file, else `billgen.toml` in the
    /// working directory, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let candidate = Path::new(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::load(candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> String {
        // Plain structs of strings, numbers and vectors always serialize
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Check values that cannot be expressed in the types
    ///
    /// Engine orders are checked when the engine is built.
    pub fn validate(&self) -> Result<()> {
        if self.workers.ceiling == 0 {
            return Err(CoreError::Configuration(
                "workers.ceiling must be at least 1".to_string(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(CoreError::Configuration(
                "cache.capacity must be at least 1".to_string(),
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(CoreError::Configuration(
                "backend.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.engines.command.deadline_secs == 0 {
            return Err(CoreError::Configuration(
                "engines.command.deadline_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.engines.order(MediaKind::Markup), ["html"]);
        assert_eq!(
            settings.engines.order(MediaKind::Paginated),
            ["typst", "command", "simple"]
        );
        assert_eq!(settings.engines.order(MediaKind::WordProcessor), ["docx"]);
        assert!(settings.quality.enabled);
        assert!(settings.templates.builtin);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_toml_str(
            r#"
[engines]
paginated = ["simple"]

[workers]
ceiling = 2

[quality]
min_word_bytes = 10
"#,
        )
        .unwrap();
        assert_eq!(settings.engines.paginated, vec!["simple"]);
        assert_eq!(settings.engines.markup, vec!["html"]);
        assert_eq!(settings.workers.ceiling, 2);
        assert_eq!(settings.quality.min_word_bytes, 10);
        assert_eq!(settings.quality.min_markup_bytes, 200);
        assert_eq!(settings.cache.capacity, 256);
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let settings = Settings::default();
        let text = settings.to_toml_string();
        assert!(text.contains("[engines.command]"));
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let mut settings = Settings::default();
        settings.workers.ceiling = 0;
        assert!(matches!(
            settings.validate(),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_effective_workers() {
        let workers = WorkerSettings { ceiling: 4 };
        assert_eq!(workers.effective(Some(16)), 4);
        assert_eq!(workers.effective(Some(2)), 2);
        assert_eq!(workers.effective(Some(0)), 1);
        assert!((1..=4).contains(&workers.effective(None)));

        let huge = WorkerSettings { ceiling: 1000 };
        assert_eq!(huge.effective(Some(500)), HARD_MAX_WORKERS);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(Path::new("/nonexistent/billgen.toml")).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("billgen.toml");
        fs::write(&path, "[workers]\nceiling = \"many\"\n").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(CoreError::Settings { .. })
        ));
    }
}
