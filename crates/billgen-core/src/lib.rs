//! billgen-core - Billing documents from structured datasets
//!
//! Renders the six logical documents of a bill, converts each into
//! HTML, PDF and DOCX through the fallback engine, and runs batches of
//! dataset files on a bounded worker pool.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use billgen_core::{BatchOptions, JobOrchestrator, Settings};
//!
//! let settings = Settings::discover(None)?;
//! let orchestrator = JobOrchestrator::new(&settings, BatchOptions::new("out"))?;
//! let batch = orchestrator.run_batch(&[PathBuf::from("bill.json")]);
//! println!("{} of {} succeeded", batch.succeeded, batch.jobs.len());
//! # Ok::<(), billgen_core::CoreError>(())
//! ```

pub mod assembler;
pub mod backends;
pub mod config;
pub mod document;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod renderer;
pub mod report;
pub mod template;

pub use assembler::{Assembly, DocumentAssembler};
pub use backends::{build_engine, builtin_backends, configure, BUILTIN_BACKENDS};
pub use config::{Settings, DEFAULT_CONFIG_FILE, HARD_MAX_WORKERS};
pub use document::{LogicalDocument, UnknownDocument, COMBINED_TITLE};
pub use error::{CoreError, ErrorClass, RenderError, Result};
pub use orchestrator::{BatchOptions, JobOrchestrator, ProgressEvent};
pub use renderer::ContentRenderer;
pub use report::{BatchResult, JobError, JobResult, ProcessingMode, ProducedOutput};
pub use template::{ResolvedTemplate, Template, TemplateRegistry, TemplateSource};

/// Version of the JSON report layout
pub const CONTRACT_VERSION: &str = "1";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
