//! Tools the writer drives but does not implement

mod git;
mod site;

pub use git::{parse_porcelain, GitCli, RepoStatus, VersionControl};
pub use site::{HexoCli, SiteGenerator, ToolOutput};
