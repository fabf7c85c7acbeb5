//! Version control of the blog sources through the `git` command

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::site::ToolOutput;
use crate::error::{Result, WriterError};

/// Working tree summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    pub is_clean: bool,
    /// `None` on a detached HEAD
    pub branch: Option<String>,
    pub untracked: Vec<String>,
    pub modified: Vec<String>,
    pub staged: Vec<String>,
}

pub trait VersionControl {
    fn status(&self) -> Result<RepoStatus>;
    /// Stage everything and commit; `false` when there was nothing to commit
    fn commit(&self, message: &str) -> Result<bool>;
    fn push(&self) -> Result<ToolOutput>;
    fn pull(&self) -> Result<ToolOutput>;
}

#[derive(Debug, Clone)]
pub struct GitCli {
    toplevel: PathBuf,
    remote: String,
}

impl GitCli {
    /// Find the repository containing `root`
    pub fn discover(root: &Path, remote: impl Into<String>) -> Result<Self> {
        let out = git_in(root, &["rev-parse", "--show-toplevel"])?.into_result("git")?;
        let toplevel = PathBuf::from(out.stdout.trim());
        tracing::debug!("Git repository at {:?}", toplevel);
        Ok(Self {
            toplevel,
            remote: remote.into(),
        })
    }

    pub fn toplevel(&self) -> &Path {
        &self.toplevel
    }

    fn git(&self, args: &[&str]) -> Result<ToolOutput> {
        git_in(&self.toplevel, args)
    }
}

impl VersionControl for GitCli {
    fn status(&self) -> Result<RepoStatus> {
        let out = self
            .git(&["status", "--porcelain=v1", "--branch"])?
            .into_result("git status")?;
        Ok(parse_porcelain(&out.stdout))
    }

    fn commit(&self, message: &str) -> Result<bool> {
        self.git(&["add", "--all"])?.into_result("git add")?;

        let pending = self.git(&["status", "--porcelain=v1"])?.into_result("git status")?;
        if pending.stdout.trim().is_empty() {
            tracing::info!("Nothing to commit");
            return Ok(false);
        }

        self.git(&["commit", "-m", message])?.into_result("git commit")?;
        tracing::info!("Committed: {}", message);
        Ok(true)
    }

    fn push(&self) -> Result<ToolOutput> {
        self.git(&["push", self.remote.as_str()])?.into_result("git push")
    }

    fn pull(&self) -> Result<ToolOutput> {
        self.git(&["pull", self.remote.as_str()])?.into_result("git pull")
    }
}

fn git_in(dir: &Path, args: &[&str]) -> Result<ToolOutput> {
    tracing::debug!("git {} in {:?}", args.join(" "), dir);
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| WriterError::ExternalTool {
            tool: "git".to_string(),
            message: format!("failed to start: {}", e),
        })?;

    Ok(ToolOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Parse `git status --porcelain=v1 --branch` output
pub fn parse_porcelain(output: &str) -> RepoStatus {
    let mut status = RepoStatus::default();

    for line in output.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            status.branch = parse_branch(header);
            continue;
        }
        if line.len() < 4 {
            continue;
        }

        let (code, path) = line.split_at(2);
        let path = path.trim_start();
        // Renames and copies list `old -> new`
        let path = path.rsplit(" -> ").next().unwrap_or(path).to_string();

        let mut flags = code.chars();
        let index = flags.next().unwrap_or(' ');
        let worktree = flags.next().unwrap_or(' ');

        if code == "??" {
            status.untracked.push(path);
            continue;
        }
        if index != ' ' && index != '!' {
            status.staged.push(path.clone());
        }
        if worktree != ' ' && worktree != '!' {
            status.modified.push(path);
        }
    }

    status.is_clean =
        status.untracked.is_empty() && status.modified.is_empty() && status.staged.is_empty();
    status
}

fn parse_branch(header: &str) -> Option<String> {
    if header.starts_with("HEAD (no branch)") {
        return None;
    }
    let header = header
        .strip_prefix("No commits yet on ")
        .or_else(|| header.strip_prefix("Initial commit on "))
        .unwrap_or(header);
    let name = header.split("...").next().unwrap_or(header);
    let name = name.split_whitespace().next().unwrap_or(name);
    Some(name.to_string())
}
