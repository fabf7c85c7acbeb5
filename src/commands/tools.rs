//! `site` and `git` commands

use anyhow::Result;

use super::print_json;
use crate::external::{RepoStatus, SiteGenerator, ToolOutput, VersionControl};
use crate::Blog;

/// Commit message used when none is given
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update blog";

/// Files listed per category before the rest is summarized
const STATUS_PREVIEW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStep {
    Clean,
    /// Generate, optionally cleaning first
    Generate { clean: bool },
    Serve { port: u16 },
    Deploy,
}

pub fn site(blog: &Blog, step: SiteStep) -> Result<()> {
    let hexo = blog.site()?;

    match step {
        SiteStep::Clean => finish(hexo.clean()?, "hexo clean", "Cleaned successfully!"),
        SiteStep::Generate { clean } => {
            if clean {
                finish(hexo.clean()?, "hexo clean", "Cleaned successfully!")?;
            }
            finish(hexo.generate()?, "hexo generate", "Generated successfully!")
        }
        SiteStep::Serve { port } => {
            println!("Starting server at http://localhost:{}", port);
            finish(hexo.serve(port)?, "hexo server", "Server stopped")
        }
        SiteStep::Deploy => finish(hexo.deploy()?, "hexo deploy", "Deployed successfully!"),
    }
}

fn finish(output: ToolOutput, tool: &str, done: &str) -> Result<()> {
    let output = output.into_result(tool)?;
    if !output.stdout.trim().is_empty() {
        print!("{}", output.stdout);
    }
    println!("{}", done);
    Ok(())
}

pub fn git_status(blog: &Blog, json: bool) -> Result<()> {
    let status = blog.git()?.status()?;
    if json {
        return print_json(&status);
    }
    print!("{}", describe_status(&status));
    Ok(())
}

pub fn git_commit(blog: &Blog, message: Option<&str>) -> Result<()> {
    let message = message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_COMMIT_MESSAGE);

    if blog.git()?.commit(message)? {
        println!("Committed: {}", message);
    } else {
        println!("Nothing to commit");
    }
    Ok(())
}

pub fn git_push(blog: &Blog) -> Result<()> {
    let git = blog.git()?;
    let output = git.push()?;
    print!("{}{}", output.stdout, output.stderr);
    println!("Pushed to {}", blog.config.git_remote);
    Ok(())
}

pub fn git_pull(blog: &Blog) -> Result<()> {
    let git = blog.git()?;
    let output = git.pull()?;
    print!("{}", output.stdout);
    println!("Pulled from {}", blog.config.git_remote);
    Ok(())
}

/// Human-readable status, long file lists cut short
pub fn describe_status(status: &RepoStatus) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Branch: {}\n",
        status.branch.as_deref().unwrap_or("(detached)")
    ));
    out.push_str(if status.is_clean {
        "Status: clean\n"
    } else {
        "Status: has changes\n"
    });

    for (label, files) in [
        ("Staged", &status.staged),
        ("Modified", &status.modified),
        ("Untracked", &status.untracked),
    ] {
        if files.is_empty() {
            continue;
        }
        out.push_str(&format!("{} ({}):\n", label, files.len()));
        for file in files.iter().take(STATUS_PREVIEW) {
            out.push_str(&format!("  - {}\n", file));
        }
        if files.len() > STATUS_PREVIEW {
            out.push_str(&format!("  ... and {} more\n", files.len() - STATUS_PREVIEW));
        }
    }
    out
}
