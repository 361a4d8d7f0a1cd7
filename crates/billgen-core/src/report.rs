//! Job and batch reports
//!
//! Reports are plain data: they serialize to the JSON printed by
//! `billgen generate --format json` and read back unchanged.

use std::path::PathBuf;

use billgen_engine::MediaKind;
use serde::{Deserialize, Serialize};

use crate::document::LogicalDocument;
use crate::error::ErrorClass;

/// How a batch schedules its jobs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    Sequential,
    #[default]
    Parallel,
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Sequential => f.write_str("sequential"),
            ProcessingMode::Parallel => f.write_str("parallel"),
        }
    }
}

/// One file written for a (document, kind) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducedOutput {
    pub document: LogicalDocument,
    pub kind: MediaKind,
    /// Backend that produced the bytes
    pub backend: String,
    pub bytes: usize,
    pub path: PathBuf,
    /// Served from the conversion cache
    pub cached: bool,
}

/// A failure attributed to a file and, where known, a document and kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub class: ErrorClass,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<LogicalDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    pub message: String,
}

impl JobError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        Self {
            class,
            document: None,
            kind: None,
            message: message.into(),
        }
    }

    pub fn for_document(mut self, document: LogicalDocument) -> Self {
        self.document = Some(document);
        self
    }

    pub fn for_kind(mut self, kind: MediaKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.document, self.kind) {
            (Some(document), Some(kind)) => write!(f, "{} [{}]: {}", document, kind, self.message),
            (Some(document), None) => write!(f, "{}: {}", document, self.message),
            (None, Some(kind)) => write!(f, "[{}]: {}", kind, self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

/// Outcome of processing one input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    pub input: PathBuf,
    /// Name of the job's output directory and archive
    pub stem: String,
    pub outputs: Vec<ProducedOutput>,
    pub errors: Vec<JobError>,
    /// Merged PDF, when at least one PDF was produced
    pub combined_pdf: Option<PathBuf>,
    pub archive: Option<PathBuf>,
    pub total_bytes: u64,
    pub elapsed_ms: u64,
    /// Change in process resident memory over the job
    ///
    /// Only recorded when the batch runs a single worker; with several
    /// workers the process-wide figure mixes concurrent jobs and this
    /// stays `None`.
    pub memory_delta_bytes: Option<i64>,
}

impl JobResult {
    pub fn new(input: PathBuf, stem: impl Into<String>) -> Self {
        Self {
            input,
            stem: stem.into(),
            outputs: Vec::new(),
            errors: Vec::new(),
            combined_pdf: None,
            archive: None,
            total_bytes: 0,
            elapsed_ms: 0,
            memory_delta_bytes: None,
        }
    }

    /// At least one valid document was produced
    pub fn is_success(&self) -> bool {
        !self.outputs.is_empty()
    }

    /// Every (document, kind) pair was produced and nothing failed
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Outputs of one media kind, in canonical document order
    pub fn outputs_of(&self, kind: MediaKind) -> impl Iterator<Item = &ProducedOutput> {
        self.outputs.iter().filter(move |o| o.kind == kind)
    }

    pub fn cache_hits(&self) -> usize {
        self.outputs.iter().filter(|o| o.cached).count()
    }
}

/// Outcome of a whole batch, jobs in input order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub contract_version: String,
    pub mode: ProcessingMode,
    pub workers: usize,
    pub jobs: Vec<JobResult>,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
}

impl BatchResult {
    pub fn new(mode: ProcessingMode, workers: usize, jobs: Vec<JobResult>, elapsed_ms: u64) -> Self {
        let succeeded = jobs.iter().filter(|j| j.is_success()).count();
        Self {
            contract_version: crate::CONTRACT_VERSION.to_string(),
            mode,
            workers,
            failed: jobs.len() - succeeded,
            succeeded,
            jobs,
            elapsed_ms,
        }
    }

    /// Process exit code: 0 when any file produced a valid document
    pub fn exit_code(&self) -> i32 {
        if self.succeeded > 0 {
            0
        } else {
            1
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.jobs.iter().map(|j| j.total_bytes).sum()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
