//! Batch orchestration
//!
//! Each input file is an independent job: load the dataset, assemble
//! its documents into `<output_root>/<stem>/`. Jobs run on a bounded
//! rayon pool (or one after another in sequential mode) and share the
//! engine, template registry and conversion cache. One file failing
//! never affects another.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use billgen_data::load_dataset;
use billgen_engine::{CacheStore, ConversionEngine};
use rayon::prelude::*;

use crate::assembler::DocumentAssembler;
use crate::backends::build_engine;
use crate::config::Settings;
use crate::error::{CoreError, ErrorClass, Result};
use crate::memory;
use crate::report::{BatchResult, JobError, JobResult, ProcessingMode};
use crate::template::TemplateRegistry;

/// Per-run options, usually from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub mode: ProcessingMode,
    /// Requested worker count; `None` uses the host's parallelism
    pub max_workers: Option<usize>,
    pub quality_checks: bool,
    pub output_root: PathBuf,
}

impl BatchOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            mode: ProcessingMode::default(),
            max_workers: None,
            quality_checks: true,
            output_root: output_root.into(),
        }
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = Some(workers);
        self
    }

    pub fn with_quality_checks(mut self, enabled: bool) -> Self {
        self.quality_checks = enabled;
        self
    }
}

/// Job lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { index: usize, input: PathBuf },
    Finished { index: usize, input: PathBuf, success: bool },
}

type ProgressFn = dyn Fn(&ProgressEvent) + Send + Sync;

/// Runs batches of dataset files
pub struct JobOrchestrator {
    assembler: DocumentAssembler,
    cache: Arc<CacheStore>,
    settings: Settings,
    options: BatchOptions,
    workers: usize,
    progress: Option<Box<ProgressFn>>,
}

impl std::fmt::Debug for JobOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobOrchestrator")
            .field("options", &self.options)
            .field("workers", &self.workers)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl JobOrchestrator {
    /// Validate everything a batch needs before any job starts
    ///
    /// Bad settings, an unknown backend, a missing template directory
    /// or an unusable output root fail here.
    pub fn new(settings: &Settings, options: BatchOptions) -> Result<Self> {
        settings.validate()?;
        let engine = build_engine(settings, options.quality_checks)?;
        Self::with_engine(engine, settings, options)
    }

    /// Like [`JobOrchestrator::new`] with a prebuilt engine
    pub fn with_engine(
        engine: ConversionEngine,
        settings: &Settings,
        options: BatchOptions,
    ) -> Result<Self> {
        if options.max_workers == Some(0) {
            return Err(CoreError::Configuration(
                "worker count must be at least 1".to_string(),
            ));
        }
        let cache = CacheStore::with_capacity(settings.cache.capacity).ok_or_else(|| {
            CoreError::Configuration("cache.capacity must be at least 1".to_string())
        })?;
        let templates = TemplateRegistry::new(&settings.templates)?;
        prepare_output_root(&options.output_root)?;

        let workers = match options.mode {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => settings.workers.effective(options.max_workers),
        };

        let cache = Arc::new(cache);
        let assembler =
            DocumentAssembler::new(Arc::new(engine), Arc::clone(&cache), Arc::new(templates));

        Ok(Self {
            assembler,
            cache,
            settings: settings.clone(),
            options,
            workers,
            progress: None,
        })
    }

    /// Receive a callback as each job starts and finishes
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn engine(&self) -> &ConversionEngine {
        self.assembler.engine()
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Process every file; results come back in input order
    pub fn run_batch(&self, files: &[PathBuf]) -> BatchResult {
        let start = Instant::now();
        let stems = unique_stems(files);
        let completed = AtomicUsize::new(0);

        tracing::info!(
            files = files.len(),
            mode = %self.options.mode,
            workers = self.workers,
            "Starting batch"
        );

        let run = |(index, input): (usize, &PathBuf)| {
            self.notify(ProgressEvent::Started {
                index,
                input: input.clone(),
            });
            let job = self.run_job(input, &stems[index]);
            self.notify(ProgressEvent::Finished {
                index,
                input: input.clone(),
                success: job.is_success(),
            });
            self.after_job(completed.fetch_add(1, Ordering::SeqCst) + 1);
            job
        };

        let jobs: Vec<JobResult> = match self.options.mode {
            ProcessingMode::Sequential => files.iter().enumerate().map(&run).collect(),
            ProcessingMode::Parallel => match rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
            {
                Ok(pool) => pool.install(|| files.par_iter().enumerate().map(&run).collect()),
                Err(e) => {
                    tracing::warn!("Cannot start worker pool, running sequentially: {}", e);
                    files.iter().enumerate().map(&run).collect()
                }
            },
        };

        let batch = BatchResult::new(
            self.options.mode,
            self.workers,
            jobs,
            start.elapsed().as_millis() as u64,
        );
        let stats = self.cache.stats();
        tracing::info!(
            succeeded = batch.succeeded,
            failed = batch.failed,
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            elapsed_ms = batch.elapsed_ms,
            "Batch finished"
        );
        batch
    }

    /// Load and assemble one file
    pub fn run_job(&self, input: &Path, stem: &str) -> JobResult {
        let start = Instant::now();
        // RSS is process-wide; a delta only describes this job when no
        // other job runs alongside it.
        let measure = self.workers == 1;
        let before = if measure { memory::resident_bytes() } else { None };
        let mut job = JobResult::new(input.to_path_buf(), stem);

        match load_dataset(input) {
            Ok(dataset) => {
                let out_dir = self.options.output_root.join(stem);
                let assembly = self.assembler.assemble(&dataset, stem, &out_dir);
                job.outputs = assembly.outputs;
                job.errors = assembly.errors;
                job.combined_pdf = assembly.combined_pdf;
                job.archive = assembly.archive;
                job.total_bytes = assembly.total_bytes;
            }
            Err(e) => {
                tracing::warn!(input = %input.display(), "{}", e);
                job.errors.push(JobError::new(ErrorClass::Dataset, e.to_string()));
            }
        }

        job.elapsed_ms = start.elapsed().as_millis() as u64;
        if measure {
            job.memory_delta_bytes = memory::delta(before, memory::resident_bytes());
        }
        tracing::debug!(
            input = %input.display(),
            outputs = job.outputs.len(),
            errors = job.errors.len(),
            elapsed_ms = job.elapsed_ms,
            "Job finished"
        );
        job
    }

    fn notify(&self, event: ProgressEvent) {
        if let Some(callback) = &self.progress {
            callback(&event);
        }
    }

    /// Periodic cache reclamation between jobs
    fn after_job(&self, completed: usize) {
        let every = self.settings.cache.reclaim_every;
        if every == 0 || completed % every != 0 {
            return;
        }
        let evicted = self.cache.trim_to(self.settings.cache.reclaim_retain);
        match memory::resident_bytes() {
            Some(rss) => tracing::info!(
                completed,
                evicted,
                resident = %memory::format_bytes(rss),
                "Reclaimed cache"
            ),
            None => tracing::info!(completed, evicted, "Reclaimed cache"),
        }
    }
}

fn prepare_output_root(root: &Path) -> Result<()> {
    if root.exists() && !root.is_dir() {
        return Err(CoreError::Configuration(format!(
            "output root {} is not a directory",
            root.display()
        )));
    }
    std::fs::create_dir_all(root).map_err(|e| {
        CoreError::Configuration(format!(
            "cannot create output root {}: {}",
            root.display(),
            e
        ))
    })
}

/// Output directory names, one per input
///
/// A stem already issued gets the first free `-2`, `-3`... suffix, so
/// no two inputs share a directory even when a suffixed name is itself
/// an input stem.
pub fn unique_stems(files: &[PathBuf]) -> Vec<String> {
    let mut issued: HashSet<String> = HashSet::new();
    files
        .iter()
        .map(|path| {
            let base = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "dataset".to_string());
            let mut stem = base.clone();
            let mut n = 1;
            while issued.contains(&stem) {
                n += 1;
                stem = format!("{}-{}", base, n);
            }
            issued.insert(stem.clone());
            stem
        })
        .collect()
}
