//! billgen CLI - Command-line interface library
//!
//! - Generate: render every document of each dataset file to HTML, PDF and DOCX
//! - Engines: show the configured backend chains and their availability
//! - Templates: write the built-in templates for local editing
//! - Config: print the effective configuration
//!
//! # Binary Usage
//!
//! ```bash
//! # Generate bills for every dataset under bills/, four workers
//! billgen generate bills/ -o out -j 4
//!
//! # Machine-readable report
//! billgen generate march.json --format json
//!
//! # Which PDF backends can run on this host
//! billgen engines
//! ```

pub mod app;

pub use app::{
    collect_inputs, config_command, engines_command, generate_command, templates_init_command,
};
pub use app::{run_cli, ModeArg, OutputFormat, EXIT_CONFIG, EXIT_FAILED, EXIT_OK};
