//! Conversion engine construction from settings

use std::time::Duration;

use billgen_engine::{ConversionEngine, EngineBuilder, MediaKind, QualityPolicy};
use billgen_html::HtmlBackend;
use billgen_ooxml::DocxBackend;
use billgen_pdf::{CommandBackend, ConverterCommand, SimplePdfBackend, TypstBackend};

use crate::config::Settings;
use crate::error::Result;

/// Ids of every backend shipped with billgen
pub const BUILTIN_BACKENDS: [&str; 5] = [
    HtmlBackend::NAME,
    TypstBackend::NAME,
    CommandBackend::NAME,
    SimplePdfBackend::NAME,
    DocxBackend::NAME,
];

/// Builder with all built-in backends registered and no orders set
pub fn builtin_backends(settings: &Settings) -> EngineBuilder {
    let command = ConverterCommand::new(settings.engines.command.program.clone())
        .with_args(settings.engines.command.args.iter().cloned())
        .with_deadline(Duration::from_secs(settings.engines.command.deadline_secs));

    ConversionEngine::builder()
        .backend(HtmlBackend::new())
        .backend(TypstBackend::with_fonts(settings.engines.typst.fonts.clone()))
        .backend(CommandBackend::new(command))
        .backend(SimplePdfBackend::new())
        .backend(DocxBackend::new())
}

/// Apply the configured orders, quality policy and timeout
///
/// Pass `quality_checks = false` to accept any non-empty output.
pub fn configure(builder: EngineBuilder, settings: &Settings, quality_checks: bool) -> EngineBuilder {
    let policy = if quality_checks {
        settings.quality.clone()
    } else {
        QualityPolicy {
            enabled: false,
            ..settings.quality.clone()
        }
    };
    let mut builder = builder
        .quality(policy)
        .timeout(settings.backend.timeout());
    for &kind in MediaKind::all() {
        builder = builder.order(kind, settings.engines.order(kind).iter().cloned());
    }
    builder
}

/// Engine with the built-in backends, configured from settings
pub fn build_engine(settings: &Settings, quality_checks: bool) -> Result<ConversionEngine> {
    let engine = configure(builtin_backends(settings), settings, quality_checks).build()?;
    Ok(engine)
}
