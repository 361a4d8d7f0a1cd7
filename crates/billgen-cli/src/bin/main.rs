//! billgen CLI binary entry point
//!
//! This is a thin wrapper that calls the library's `run_cli()` function.

use anyhow::Result;
use billgen_cli::run_cli;

fn main() -> Result<()> {
    let code = run_cli()?;
    std::process::exit(code);
}
