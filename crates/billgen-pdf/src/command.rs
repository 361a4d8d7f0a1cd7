//! External HTML-to-PDF converter
//!
//! Writes the rendered HTML into a scratch directory and runs a
//! configured program (e.g. `wkhtmltopdf {input} {output}`). The child is
//! killed once its deadline passes.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use billgen_ast::Document;
use billgen_html::HtmlWriter;

use crate::error::{PdfError, Result};

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Invocation of an external converter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterCommand {
    /// Program name (looked up on PATH) or path
    pub program: String,
    /// Arguments; `{input}` and `{output}` are replaced with file paths
    pub args: Vec<String>,
    /// Process deadline
    pub deadline: Duration,
}

impl ConverterCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![INPUT_PLACEHOLDER.to_string(), OUTPUT_PLACEHOLDER.to_string()],
            deadline: Duration::from_secs(60),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolve the program to an executable path
    pub fn locate(&self) -> Option<PathBuf> {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.is_file().then(|| program.to_path_buf());
        }
        let path = env::var_os("PATH")?;
        env::split_paths(&path)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }

    /// Convert rendered content to PDF through the external program
    pub fn run(&self, content: &Document) -> Result<Vec<u8>> {
        let scratch = tempfile::Builder::new().prefix("billgen-").tempdir()?;
        let input = scratch.path().join("input.html");
        let output = scratch.path().join("output.pdf");
        fs::write(&input, HtmlWriter::write(content))?;

        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
                    .replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy())
            })
            .collect();

        log::debug!("Running converter {} {:?}", self.program, args);
        let mut child = Command::new(&self.program)
            .args(&args)
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PdfError::Command(format!("cannot start {}: {}", self.program, e)))?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(PdfError::CommandTimeout(self.deadline.as_secs()));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            return Err(PdfError::Command(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        fs::read(&output).map_err(|e| {
            PdfError::Command(format!("{} wrote no output: {}", self.program, e))
        })
    }
}
