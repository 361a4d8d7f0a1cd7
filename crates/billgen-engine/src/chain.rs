//! Conversion engine with ordered fallback chain
//!
//! The engine holds every registered backend and, per media kind, an
//! ordered list of backend ids. A conversion walks that list until one
//! backend produces output that passes quality validation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ConversionEngine                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │  paginated: [typst, command, simple]                          │
//! │     │                                                         │
//! │     ├─ unavailable ─────────────► record, next                │
//! │     ├─ error / timeout / panic ─► record, next                │
//! │     ├─ output fails validation ─► record, next                │
//! │     └─ output passes ───────────► ConversionResult            │
//! │                                                               │
//! │  all attempts failed ───────────► ConversionExhausted         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use billgen_ast::Document;
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, BackendResult, ConversionBackend};
use crate::types::MediaKind;
use crate::validate::{QualityPolicy, Verdict};

/// What happened when one backend was tried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Output passed validation
    Accepted,
    /// The backend errored, timed out or panicked
    Failed(String),
    /// The backend succeeded but its output failed validation
    Rejected(String),
    /// The backend reported itself unavailable and was not invoked
    Unavailable,
}

/// One entry of the attempt log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub backend: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
    pub elapsed_ms: u64,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Accepted => write!(f, "{}: accepted", self.backend),
            AttemptOutcome::Failed(reason) => write!(f, "{}: failed ({})", self.backend, reason),
            AttemptOutcome::Rejected(reason) => {
                write!(f, "{}: rejected ({})", self.backend, reason)
            }
            AttemptOutcome::Unavailable => write!(f, "{}: unavailable", self.backend),
        }
    }
}

/// Validated output of a conversion
///
/// Only built by the engine once the verdict is [`Verdict::Pass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub data: Vec<u8>,
    pub kind: MediaKind,
    pub verdict: Verdict,
    /// Backend that produced `data`
    pub backend: String,
    /// Every attempt made, the accepted one last
    pub attempts: Vec<Attempt>,
}

impl ConversionResult {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Every configured backend failed for one media kind
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", describe_exhausted(.kind, .attempts))]
pub struct ConversionExhausted {
    pub kind: MediaKind,
    pub attempts: Vec<Attempt>,
}

fn describe_exhausted(kind: &MediaKind, attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return format!("No backend attempted for {}", kind);
    }
    let log: Vec<String> = attempts.iter().map(ToString::to_string).collect();
    format!(
        "All {} backends failed for {}: {}",
        attempts.len(),
        kind,
        log.join("; ")
    )
}

/// Invalid engine configuration, detected at build time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineConfigError {
    #[error("Engine order for {0} is empty")]
    EmptyOrder(MediaKind),

    #[error("Unknown backend '{id}' in {kind} engine order")]
    UnknownBackend { kind: MediaKind, id: String },

    #[error("Backend '{id}' cannot produce {kind}")]
    KindMismatch { kind: MediaKind, id: String },

    #[error("Backend '{id}' listed twice in {kind} engine order")]
    DuplicateInOrder { kind: MediaKind, id: String },

    #[error("Backend '{0}' registered twice")]
    DuplicateBackend(String),

    #[error("Backend timeout must be positive")]
    ZeroTimeout,
}

/// Builder for [`ConversionEngine`]
#[derive(Default)]
pub struct EngineBuilder {
    backends: Vec<Arc<dyn ConversionBackend>>,
    order: BTreeMap<MediaKind, Vec<String>>,
    policy: QualityPolicy,
    timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Register a backend under its own name
    pub fn backend<B: ConversionBackend + 'static>(mut self, backend: B) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Register an already shared backend
    pub fn shared_backend(mut self, backend: Arc<dyn ConversionBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Set the ordered backend ids tried for a media kind
    pub fn order<I, S>(mut self, kind: MediaKind, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order
            .insert(kind, ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn quality(mut self, policy: QualityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound every backend invocation by `limit`
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Validate the configuration and build the engine
    ///
    /// Every media kind needs a non-empty order naming registered
    /// backends able to produce that kind.
    pub fn build(self) -> Result<ConversionEngine, EngineConfigError> {
        if self.timeout == Some(Duration::ZERO) {
            return Err(EngineConfigError::ZeroTimeout);
        }

        let mut backends: BTreeMap<String, Arc<dyn ConversionBackend>> = BTreeMap::new();
        for backend in self.backends {
            let name = backend.name().to_string();
            if backends.insert(name.clone(), backend).is_some() {
                return Err(EngineConfigError::DuplicateBackend(name));
            }
        }

        for &kind in MediaKind::all() {
            let ids = self.order.get(&kind).map(Vec::as_slice).unwrap_or(&[]);
            if ids.is_empty() {
                return Err(EngineConfigError::EmptyOrder(kind));
            }
            let mut seen = BTreeSet::new();
            for id in ids {
                let backend = backends
                    .get(id)
                    .ok_or_else(|| EngineConfigError::UnknownBackend {
                        kind,
                        id: id.clone(),
                    })?;
                if !backend.produces(kind) {
                    return Err(EngineConfigError::KindMismatch {
                        kind,
                        id: id.clone(),
                    });
                }
                if !seen.insert(id.as_str()) {
                    return Err(EngineConfigError::DuplicateInOrder {
                        kind,
                        id: id.clone(),
                    });
                }
            }
        }

        Ok(ConversionEngine {
            backends,
            order: self.order,
            policy: self.policy,
            timeout: self.timeout,
        })
    }
}

/// Availability of one configured backend, for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub kind: MediaKind,
    pub position: usize,
    pub backend: String,
    pub available: bool,
}

/// Ordered-fallback conversion engine
///
/// Shared by all workers; holds no mutable state.
///
/// # Example
///
/// ```ignore
/// let engine = ConversionEngine::builder()
///     .backend(HtmlBackend::new())
///     .backend(TypstBackend::new())
///     .backend(SimplePdfBackend::new())
///     .backend(DocxBackend::new())
///     .order(MediaKind::Markup, ["html"])
///     .order(MediaKind::Paginated, ["typst", "simple"])
///     .order(MediaKind::WordProcessor, ["docx"])
///     .timeout(Duration::from_secs(60))
///     .build()?;
///
/// let result = engine.convert(&content, MediaKind::Paginated)?;
/// println!("{} produced {} bytes", result.backend, result.len());
/// ```
pub struct ConversionEngine {
    backends: BTreeMap<String, Arc<dyn ConversionBackend>>,
    order: BTreeMap<MediaKind, Vec<String>>,
    policy: QualityPolicy,
    timeout: Option<Duration>,
}

impl fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .field("order", &self.order)
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConversionEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Configured backend order for a media kind
    pub fn order_for(&self, kind: MediaKind) -> &[String] {
        self.order.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Names of all registered backends
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    pub fn policy(&self) -> &QualityPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Configured chains with the current availability of each backend
    pub fn status(&self) -> Vec<BackendStatus> {
        let mut status = Vec::new();
        for (&kind, ids) in &self.order {
            for (position, id) in ids.iter().enumerate() {
                let available = self
                    .backends
                    .get(id)
                    .map(|b| b.is_available())
                    .unwrap_or(false);
                status.push(BackendStatus {
                    kind,
                    position: position + 1,
                    backend: id.clone(),
                    available,
                });
            }
        }
        status
    }

    /// Convert content using the configured order for `kind`
    pub fn convert(
        &self,
        content: &Arc<Document>,
        kind: MediaKind,
    ) -> Result<ConversionResult, ConversionExhausted> {
        self.convert_with_order(content, kind, self.order_for(kind))
    }

    /// Convert content trying the given backend ids in order
    ///
    /// Each backend is invoked at most once. Unknown ids are recorded
    /// as failed attempts.
    pub fn convert_with_order<S: AsRef<str>>(
        &self,
        content: &Arc<Document>,
        kind: MediaKind,
        order: &[S],
    ) -> Result<ConversionResult, ConversionExhausted> {
        let mut attempts = Vec::with_capacity(order.len());

        for id in order {
            let id = id.as_ref();
            let started = Instant::now();

            let Some(backend) = self.backends.get(id) else {
                let outcome = AttemptOutcome::Failed("unknown backend".to_string());
                attempts.push(attempt(id, outcome, started));
                continue;
            };

            if !backend.produces(kind) {
                let reason = BackendError::UnsupportedKind(kind).to_string();
                attempts.push(attempt(id, AttemptOutcome::Failed(reason), started));
                continue;
            }

            if !backend.is_available() {
                log::debug!("Backend {} is not available, skipping", id);
                attempts.push(attempt(id, AttemptOutcome::Unavailable, started));
                continue;
            }

            let data = match self.invoke(backend, content, kind) {
                Ok(data) if data.is_empty() => {
                    log::warn!("Backend {} produced empty {} output", id, kind);
                    let reason = BackendError::EmptyOutput.to_string();
                    attempts.push(attempt(id, AttemptOutcome::Failed(reason), started));
                    continue;
                }
                Ok(data) => data,
                Err(e) => {
                    log::warn!("Backend {} failed for {}: {}", id, kind, e);
                    attempts.push(attempt(id, AttemptOutcome::Failed(e.to_string()), started));
                    continue;
                }
            };

            match self.policy.check(kind, &data) {
                Verdict::Pass => {
                    log::debug!(
                        "Converted {} with {} ({} bytes)",
                        kind,
                        id,
                        data.len()
                    );
                    attempts.push(attempt(id, AttemptOutcome::Accepted, started));
                    return Ok(ConversionResult {
                        data,
                        kind,
                        verdict: Verdict::Pass,
                        backend: id.to_string(),
                        attempts,
                    });
                }
                Verdict::Fail(reason) => {
                    log::warn!("Output of {} rejected for {}: {}", id, kind, reason);
                    attempts.push(attempt(id, AttemptOutcome::Rejected(reason), started));
                }
            }
        }

        Err(ConversionExhausted { kind, attempts })
    }

    fn invoke(
        &self,
        backend: &Arc<dyn ConversionBackend>,
        content: &Arc<Document>,
        kind: MediaKind,
    ) -> BackendResult<Vec<u8>> {
        let Some(limit) = self.timeout else {
            return guarded(backend.as_ref(), content, kind);
        };

        // A timed-out invocation keeps running on its detached thread;
        // its result is dropped when it eventually sends.
        let (tx, rx) = mpsc::channel();
        let thread_name = format!("backend-{}", backend.name());
        let backend = Arc::clone(backend);
        let content = Arc::clone(content);
        thread::Builder::new().name(thread_name).spawn(move || {
            let _ = tx.send(guarded(backend.as_ref(), &content, kind));
        })?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(BackendError::Timeout(limit)),
            Err(RecvTimeoutError::Disconnected) => Err(BackendError::Panic(
                "backend thread exited without a result".to_string(),
            )),
        }
    }
}

fn attempt(backend: &str, outcome: AttemptOutcome, started: Instant) -> Attempt {
    Attempt {
        backend: backend.to_string(),
        outcome,
        elapsed_ms: started.elapsed().as_millis() as u64,
    }
}

fn guarded(
    backend: &dyn ConversionBackend,
    content: &Document,
    kind: MediaKind,
) -> BackendResult<Vec<u8>> {
    panic::catch_unwind(AssertUnwindSafe(|| backend.convert(content, kind)))
        .unwrap_or_else(|payload| Err(BackendError::Panic(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pdf_bytes(len: usize) -> Vec<u8> {
        let mut data = b"%PDF-1.7\n".to_vec();
        data.resize(len - 6, b' ');
        data.extend_from_slice(b"%%EOF\n");
        data
    }

    enum Behavior {
        Produce(Vec<u8>),
        Fail,
        Panic,
        Sleep(Duration),
        Unavailable,
    }

    struct Mock {
        name: &'static str,
        kinds: Vec<MediaKind>,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl Mock {
        fn new(name: &'static str, kind: MediaKind, behavior: Behavior) -> Self {
            Self {
                name,
                kinds: vec![kind],
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    impl ConversionBackend for Mock {
        fn name(&self) -> &str {
            self.name
        }

        fn produces(&self, kind: MediaKind) -> bool {
            self.kinds.contains(&kind)
        }

        fn is_available(&self) -> bool {
            !matches!(self.behavior, Behavior::Unavailable)
        }

        fn convert(&self, _content: &Document, _kind: MediaKind) -> BackendResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Produce(data) => Ok(data.clone()),
                Behavior::Fail => Err(BackendError::Failed("layout engine crashed".into())),
                Behavior::Panic => panic!("renderer blew up"),
                Behavior::Sleep(d) => {
                    thread::sleep(*d);
                    Ok(pdf_bytes(4096))
                }
                Behavior::Unavailable => Err(BackendError::Unavailable("not installed".into())),
            }
        }
    }

    fn base_builder() -> EngineBuilder {
        let mut markup = b"<!DOCTYPE html><html>".to_vec();
        markup.resize(512, b' ');
        let mut word = b"PK\x03\x04".to_vec();
        word.resize(2048, 0);
        ConversionEngine::builder()
            .backend(Mock::new("m", MediaKind::Markup, Behavior::Produce(markup)))
            .backend(Mock::new("w", MediaKind::WordProcessor, Behavior::Produce(word)))
            .order(MediaKind::Markup, ["m"])
            .order(MediaKind::WordProcessor, ["w"])
    }

    fn content() -> Arc<Document> {
        Arc::new(Document::with_title("Summary"))
    }

    #[test]
    fn test_first_passing_backend_wins() {
        let engine = base_builder()
            .backend(Mock::new("a", MediaKind::Paginated, Behavior::Produce(pdf_bytes(2048))))
            .backend(Mock::new("b", MediaKind::Paginated, Behavior::Fail))
            .order(MediaKind::Paginated, ["a", "b"])
            .build()
            .unwrap();

        let result = engine.convert(&content(), MediaKind::Paginated).unwrap();
        assert_eq!(result.backend, "a");
        assert_eq!(result.verdict, Verdict::Pass);
        assert_eq!(result.attempts.len(), 1);
    }

    #[test]
    fn test_fallback_attributes_second_backend() {
        let a = Mock::new("a", MediaKind::Paginated, Behavior::Produce(pdf_bytes(64)));
        let c = Mock::new("c", MediaKind::Paginated, Behavior::Produce(pdf_bytes(4096)));
        let c_calls = c.calls();
        let engine = base_builder()
            .backend(a)
            .backend(Mock::new("b", MediaKind::Paginated, Behavior::Produce(pdf_bytes(4096))))
            .backend(c)
            .order(MediaKind::Paginated, ["a", "b", "c"])
            .build()
            .unwrap();

        let result = engine.convert(&content(), MediaKind::Paginated).unwrap();
        assert_eq!(result.backend, "b");
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].backend, "a");
        assert!(matches!(
            result.attempts[0].outcome,
            AttemptOutcome::Rejected(_)
        ));
        assert_eq!(result.attempts[1].outcome, AttemptOutcome::Accepted);
        assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exhaustion_reports_every_attempt() {
        let a = Mock::new("a", MediaKind::Paginated, Behavior::Fail);
        let a_calls = a.calls();
        let engine = base_builder()
            .backend(a)
            .backend(Mock::new("b", MediaKind::Paginated, Behavior::Produce(b"junk".to_vec())))
            .backend(Mock::new("c", MediaKind::Paginated, Behavior::Produce(Vec::new())))
            .order(MediaKind::Paginated, ["a", "b", "c"])
            .build()
            .unwrap();

        let err = engine.convert(&content(), MediaKind::Paginated).unwrap_err();
        assert_eq!(err.kind, MediaKind::Paginated);
        assert_eq!(err.attempts.len(), 3);
        assert!(matches!(err.attempts[0].outcome, AttemptOutcome::Failed(_)));
        assert!(matches!(err.attempts[1].outcome, AttemptOutcome::Rejected(_)));
        assert!(matches!(err.attempts[2].outcome, AttemptOutcome::Failed(_)));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert!(err.to_string().starts_with("All 3 backends failed for paginated"));
    }

    #[test]
    fn test_panicking_backend_is_contained() {
        let engine = base_builder()
            .backend(Mock::new("boom", MediaKind::Paginated, Behavior::Panic))
            .backend(Mock::new("ok", MediaKind::Paginated, Behavior::Produce(pdf_bytes(2048))))
            .order(MediaKind::Paginated, ["boom", "ok"])
            .build()
            .unwrap();

        let result = engine.convert(&content(), MediaKind::Paginated).unwrap();
        assert_eq!(result.backend, "ok");
        match &result.attempts[0].outcome {
            AttemptOutcome::Failed(reason) => assert!(reason.contains("renderer blew up")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_timeout_advances_chain() {
        let engine = base_builder()
            .backend(Mock::new(
                "slow",
                MediaKind::Paginated,
                Behavior::Sleep(Duration::from_secs(5)),
            ))
            .backend(Mock::new("fast", MediaKind::Paginated, Behavior::Produce(pdf_bytes(2048))))
            .order(MediaKind::Paginated, ["slow", "fast"])
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        let started = Instant::now();
        let result = engine.convert(&content(), MediaKind::Paginated).unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(result.backend, "fast");
        match &result.attempts[0].outcome {
            AttemptOutcome::Failed(reason) => assert!(reason.contains("timed out")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_backend_skipped() {
        let missing = Mock::new("missing", MediaKind::Paginated, Behavior::Unavailable);
        let missing_calls = missing.calls();
        let engine = base_builder()
            .backend(missing)
            .backend(Mock::new("ok", MediaKind::Paginated, Behavior::Produce(pdf_bytes(2048))))
            .order(MediaKind::Paginated, ["missing", "ok"])
            .build()
            .unwrap();

        let result = engine.convert(&content(), MediaKind::Paginated).unwrap();
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Unavailable);
        assert_eq!(missing_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_disabled_validation_accepts_small_output() {
        let engine = base_builder()
            .backend(Mock::new("tiny", MediaKind::Paginated, Behavior::Produce(b"%PDF-".to_vec())))
            .order(MediaKind::Paginated, ["tiny"])
            .quality(QualityPolicy::disabled())
            .build()
            .unwrap();

        let result = engine.convert(&content(), MediaKind::Paginated).unwrap();
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_explicit_order_with_unknown_id() {
        let engine = base_builder()
            .backend(Mock::new("ok", MediaKind::Paginated, Behavior::Produce(pdf_bytes(2048))))
            .order(MediaKind::Paginated, ["ok"])
            .build()
            .unwrap();

        let result = engine
            .convert_with_order(&content(), MediaKind::Paginated, &["ghost", "ok"][..])
            .unwrap();
        assert_eq!(result.backend, "ok");
        assert_eq!(
            result.attempts[0].outcome,
            AttemptOutcome::Failed("unknown backend".to_string())
        );
    }

    #[test]
    fn test_build_rejects_empty_order() {
        let err = base_builder()
            .order(MediaKind::Paginated, Vec::<String>::new())
            .build()
            .unwrap_err();
        assert_eq!(err, EngineConfigError::EmptyOrder(MediaKind::Paginated));
    }

    #[test]
    fn test_build_rejects_unknown_backend() {
        let err = base_builder()
            .order(MediaKind::Paginated, ["typst"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            EngineConfigError::UnknownBackend {
                kind: MediaKind::Paginated,
                id: "typst".to_string()
            }
        );
    }

    #[test]
    fn test_build_rejects_kind_mismatch_and_zero_timeout() {
        let err = base_builder()
            .order(MediaKind::Paginated, ["m"])
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineConfigError::KindMismatch { .. }));

        let err = base_builder()
            .backend(Mock::new("ok", MediaKind::Paginated, Behavior::Fail))
            .order(MediaKind::Paginated, ["ok"])
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, EngineConfigError::ZeroTimeout);
    }

    #[test]
    fn test_status_lists_chains() {
        let engine = base_builder()
            .backend(Mock::new("gone", MediaKind::Paginated, Behavior::Unavailable))
            .backend(Mock::new("ok", MediaKind::Paginated, Behavior::Fail))
            .order(MediaKind::Paginated, ["gone", "ok"])
            .build()
            .unwrap();

        let status = engine.status();
        let paginated: Vec<_> = status
            .iter()
            .filter(|s| s.kind == MediaKind::Paginated)
            .collect();
        assert_eq!(paginated.len(), 2);
        assert!(!paginated[0].available);
        assert!(paginated[1].available);
        assert_eq!(paginated[1].position, 2);
    }

    #[test]
    fn test_attempt_serializes_flat() {
        let a = Attempt {
            backend: "typst".to_string(),
            outcome: AttemptOutcome::Rejected("too small".to_string()),
            elapsed_ms: 12,
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["backend"], "typst");
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "too small");
    }
}
