//! Read-only checks over the whole corpus

mod links;
mod stats;
mod validate;

pub use links::{extract_links, IssueKind, LinkChecker, LinkIssue, MarkdownLink};
pub use stats::{collect as collect_stats, word_count, BlogStats};
pub use validate::{validate, ValidationReport, Validator};
