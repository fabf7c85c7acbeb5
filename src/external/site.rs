//! Site builder commands (`hexo clean`, `hexo generate`, ...)

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Result, WriterError};

/// What an external command printed and whether it succeeded
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Turn a failed run into `ExternalTool`, carrying stderr (or stdout)
    pub fn into_result(self, tool: &str) -> Result<ToolOutput> {
        if self.success {
            return Ok(self);
        }
        let message = if self.stderr.trim().is_empty() {
            self.stdout.trim().to_string()
        } else {
            self.stderr.trim().to_string()
        };
        Err(WriterError::ExternalTool {
            tool: tool.to_string(),
            message,
        })
    }
}

/// The static site builder that turns the corpus into a website
pub trait SiteGenerator {
    fn clean(&self) -> Result<ToolOutput>;
    fn generate(&self) -> Result<ToolOutput>;
    /// Runs in the foreground until the server exits
    fn serve(&self, port: u16) -> Result<ToolOutput>;
    fn deploy(&self) -> Result<ToolOutput>;
}

/// Hexo driven through its command line
#[derive(Debug, Clone)]
pub struct HexoCli {
    program: String,
    args: Vec<String>,
    root: PathBuf,
}

impl HexoCli {
    /// `command` is the program followed by its leading arguments (`npx hexo`)
    pub fn new(command: &[String], root: impl Into<PathBuf>) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| WriterError::Config("site_command must not be empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            root: root.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The full command line as a display string
    pub fn describe(&self, extra: &[&str]) -> String {
        let mut parts = vec![self.program.as_str()];
        parts.extend(self.args.iter().map(String::as_str));
        parts.extend(extra);
        parts.join(" ")
    }

    fn run(&self, extra: &[&str]) -> Result<ToolOutput> {
        tracing::info!("Running {} in {:?}", self.describe(extra), self.root);
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .current_dir(&self.root)
            .output()
            .map_err(|e| self.spawn_error(extra, e))?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    fn spawn_error(&self, extra: &[&str], e: std::io::Error) -> WriterError {
        WriterError::ExternalTool {
            tool: self.describe(extra),
            message: format!("failed to start: {}", e),
        }
    }
}

impl SiteGenerator for HexoCli {
    fn clean(&self) -> Result<ToolOutput> {
        self.run(&["clean"])
    }

    fn generate(&self) -> Result<ToolOutput> {
        self.run(&["generate"])
    }

    fn serve(&self, port: u16) -> Result<ToolOutput> {
        let port = port.to_string();
        let extra = ["server", "--port", port.as_str()];
        tracing::info!("Running {} in {:?}", self.describe(&extra), self.root);

        // The server logs straight to the terminal
        let status = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .current_dir(&self.root)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.spawn_error(&extra, e))?;

        Ok(ToolOutput {
            success: status.success(),
            ..Default::default()
        })
    }

    fn deploy(&self) -> Result<ToolOutput> {
        self.run(&["deploy"])
    }
}
