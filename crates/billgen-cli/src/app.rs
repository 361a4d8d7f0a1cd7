//! CLI Application logic
//!
//! Parses arguments, installs logging and dispatches to the commands.
//! Every command returns the process exit code.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::{glob, Pattern};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use billgen_core::memory::format_bytes;
use billgen_core::template::write_defaults;
use billgen_core::{
    build_engine, BatchOptions, BatchResult, CoreError, JobOrchestrator, JobResult,
    ProcessingMode, ProgressEvent, Settings,
};
use billgen_data::is_dataset_file;
use billgen_engine::MediaKind;

/// Exit code when at least one file produced a valid document
pub const EXIT_OK: i32 = 0;
/// Exit code when no file produced a valid document
pub const EXIT_FAILED: i32 = 1;
/// Exit code for configuration errors, raised before any job runs
pub const EXIT_CONFIG: i32 = 2;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for scripts and CI
    Json,
}

/// Scheduling mode for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Sequential,
    #[default]
    Parallel,
}

impl From<ModeArg> for ProcessingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => ProcessingMode::Sequential,
            ModeArg::Parallel => ProcessingMode::Parallel,
        }
    }
}

#[derive(Parser)]
#[command(name = "billgen")]
#[command(author, version, about = "Billing documents from structured datasets", long_about = None)]
struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate HTML, PDF and DOCX bills from dataset files
    Generate {
        /// Dataset files (.json, .toml) or directories containing them
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output root; each file gets its own subdirectory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Process files one at a time or on a worker pool
        #[arg(short, long, value_enum, default_value = "parallel")]
        mode: ModeArg,

        /// Worker count (capped by the configured ceiling)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        /// Accept any non-empty backend output
        #[arg(long)]
        no_quality_check: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List conversion backends per media kind and their availability
    Engines {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage document templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Configuration file path; else billgen.toml in the working directory, else defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    /// Write the built-in templates into a directory for editing
    Init {
        /// Target directory
        dir: PathBuf,

        /// Overwrite existing template files
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI application and return the process exit code
pub fn run_cli() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            inputs,
            output,
            mode,
            jobs,
            no_quality_check,
            config,
            format,
        } => {
            let options = BatchOptions {
                mode: mode.into(),
                max_workers: jobs,
                quality_checks: !no_quality_check,
                output_root: output,
            };
            generate_command(&inputs, options, config.as_deref(), format)
        }
        Commands::Engines { config, format } => engines_command(config.as_deref(), format),
        Commands::Templates {
            action: TemplateAction::Init { dir, force },
        } => templates_init_command(&dir, force),
        Commands::Config { config } => config_command(config.as_deref()),
    }
}

/// Install the stderr subscriber; `RUST_LOG` still applies per target
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the generate command
pub fn generate_command(
    inputs: &[PathBuf],
    options: BatchOptions,
    config: Option<&Path>,
    format: OutputFormat,
) -> Result<i32> {
    let files = collect_inputs(inputs)?;
    if files.is_empty() {
        eprintln!("Configuration error: no dataset files found");
        return Ok(EXIT_CONFIG);
    }

    let settings = match Settings::discover(config) {
        Ok(settings) => settings,
        Err(e) => return Ok(configuration_failure(&e)),
    };
    let orchestrator = match JobOrchestrator::new(&settings, options) {
        Ok(orchestrator) => orchestrator,
        Err(e) if e.is_configuration() => return Ok(configuration_failure(&e)),
        Err(e) => return Err(e).context("Failed to prepare batch"),
    };

    let orchestrator = if format == OutputFormat::Text {
        let total = files.len();
        orchestrator.with_progress(move |event| {
            if let ProgressEvent::Finished {
                index,
                input,
                success,
            } = event
            {
                let mark = if *success { "✓" } else { "✗" };
                eprintln!("[{}/{}] {} {}", index + 1, total, mark, input.display());
            }
        })
    } else {
        orchestrator
    };

    let batch = orchestrator.run_batch(&files);

    match format {
        OutputFormat::Json => {
            let json = batch
                .to_json()
                .context("Failed to serialize batch report to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_batch(&batch),
    }

    Ok(if batch.exit_code() == 0 {
        EXIT_OK
    } else {
        EXIT_FAILED
    })
}

fn configuration_failure(error: &CoreError) -> i32 {
    eprintln!("{}", error);
    EXIT_CONFIG
}

fn print_batch(batch: &BatchResult) {
    for job in &batch.jobs {
        print_job(job);
    }
    println!();
    println!(
        "Processed {} file(s): {} succeeded, {} failed ({}, {} worker(s), {} ms)",
        batch.jobs.len(),
        batch.succeeded,
        batch.failed,
        batch.mode,
        batch.workers,
        batch.elapsed_ms
    );
    println!("  Total output: {}", format_bytes(batch.total_bytes()));
}

fn print_job(job: &JobResult) {
    let mark = if job.is_success() { "✓" } else { "✗" };
    println!("{} {}", mark, job.input.display());
    if job.is_success() {
        println!(
            "    {} document(s), {}, {} ms, {} from cache",
            job.outputs.len(),
            format_bytes(job.total_bytes),
            job.elapsed_ms,
            job.cache_hits()
        );
    }
    if let Some(archive) = &job.archive {
        println!("    Archive: {}", archive.display());
    }
    for error in &job.errors {
        println!("    [{:?}] {}", error.class, error);
    }
}

/// Expand directories into the dataset files they contain
///
/// Directories are searched recursively and their files sorted; plain
/// file arguments are kept as given, in order.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let base = Pattern::escape(&input.display().to_string());
        let mut found = Vec::new();
        for ext in ["json", "toml"] {
            let pattern = format!("{}/**/*.{}", base, ext);
            for entry in
                glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?
            {
                match entry {
                    Ok(path) if path.is_file() && is_dataset_file(&path) => found.push(path),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Could not read {}", e),
                }
            }
        }
        found.sort();
        found.dedup();
        files.extend(found);
    }
    Ok(files)
}

/// Execute the engines command
pub fn engines_command(config: Option<&Path>, format: OutputFormat) -> Result<i32> {
    let settings = match Settings::discover(config) {
        Ok(settings) => settings,
        Err(e) => return Ok(configuration_failure(&e)),
    };
    let engine = match build_engine(&settings, true) {
        Ok(engine) => engine,
        Err(e) => return Ok(configuration_failure(&e)),
    };
    let status = engine.status();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&status)
                .context("Failed to serialize engine status to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for &kind in MediaKind::all() {
                println!("{} (.{}):", kind, kind.extension());
                for entry in status.iter().filter(|s| s.kind == kind) {
                    let state = if entry.available {
                        "available"
                    } else {
                        "unavailable"
                    };
                    println!("  {}. {:<10} {}", entry.position, entry.backend, state);
                }
            }
            if let Some(timeout) = engine.timeout() {
                println!();
                println!("Backend timeout: {}s", timeout.as_secs());
            }
        }
    }
    Ok(EXIT_OK)
}

/// Execute `templates init`
pub fn templates_init_command(dir: &Path, force: bool) -> Result<i32> {
    let written = write_defaults(dir, force)
        .with_context(|| format!("Failed to write templates to {}", dir.display()))?;

    if written.is_empty() {
        println!(
            "All templates already exist in {} (use --force to overwrite)",
            dir.display()
        );
    } else {
        for path in &written {
            println!("  Created: {}", path.display());
        }
    }
    println!();
    println!("Add this directory to [templates] dirs in your configuration to use it.");
    Ok(EXIT_OK)
}

/// Execute the config command
pub fn config_command(config: Option<&Path>) -> Result<i32> {
    let settings = match Settings::discover(config) {
        Ok(settings) => settings,
        Err(e) => return Ok(configuration_failure(&e)),
    };
    if let Err(e) = settings.validate() {
        return Ok(configuration_failure(&e));
    }
    print!("{}", settings.to_toml_string());
    Ok(EXIT_OK)
}
