//! # billgen-engine
//!
//! Conversion of rendered billing documents into markup, paginated and
//! word-processor byte streams.
//!
//! - [`ConversionBackend`]: one interchangeable converter
//! - [`ConversionEngine`]: ordered per-kind fallback chain with timeouts
//! - [`QualityPolicy`]: size and signature checks on backend output
//! - [`CacheStore`]: bounded LRU of accepted results
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use billgen_engine::{ConversionEngine, MediaKind};
//!
//! let engine = ConversionEngine::builder()
//!     .backend(my_html_backend)
//!     .backend(my_pdf_backend)
//!     .backend(my_docx_backend)
//!     .order(MediaKind::Markup, ["html"])
//!     .order(MediaKind::Paginated, ["simple"])
//!     .order(MediaKind::WordProcessor, ["docx"])
//!     .build()?;
//!
//! let pdf = engine.convert(&Arc::new(content), MediaKind::Paginated)?;
//! ```

pub mod backend;
pub mod cache;
pub mod chain;
pub mod types;
pub mod validate;

pub use backend::{BackendError, BackendResult, ConversionBackend};
pub use cache::{CacheKey, CacheStats, CacheStore};
pub use chain::{
    Attempt, AttemptOutcome, BackendStatus, ConversionEngine, ConversionExhausted,
    ConversionResult, EngineBuilder, EngineConfigError,
};
pub use types::{MediaKind, UnknownMediaKind};
pub use validate::{QualityPolicy, Verdict};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
