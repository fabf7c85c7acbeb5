//! Front-matter validation across the corpus

use indexmap::IndexSet;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::content::FrontMatter;
use crate::error::Result;
use crate::helpers::parse_timestamp;
use crate::repository::{PageRepository, PostRepository};

/// Offending files grouped by problem
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub missing_front_matter: Vec<String>,
    pub missing_title: Vec<String>,
    pub missing_date: Vec<String>,
    pub invalid_date: Vec<String>,
    /// Titles (not file names) used by more than one file
    pub duplicate_titles: Vec<String>,
    /// `name: error` for files that could not be read
    pub unreadable: Vec<String>,
}

impl ValidationReport {
    /// Every category with its entries, in report order
    pub fn categories(&self) -> [(&'static str, &[String]); 6] {
        [
            ("missing_front_matter", self.missing_front_matter.as_slice()),
            ("missing_title", self.missing_title.as_slice()),
            ("missing_date", self.missing_date.as_slice()),
            ("invalid_date", self.invalid_date.as_slice()),
            ("duplicate_titles", self.duplicate_titles.as_slice()),
            ("unreadable", self.unreadable.as_slice()),
        ]
    }

    pub fn total(&self) -> usize {
        self.categories().iter().map(|(_, items)| items.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Accumulates findings file by file
#[derive(Debug, Default)]
pub struct Validator {
    report: ValidationReport,
    seen_titles: HashSet<String>,
    duplicates: IndexSet<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one file's raw content
    pub fn check(&mut self, name: &str, raw: &str) {
        if !FrontMatter::has_block(raw) {
            self.report.missing_front_matter.push(name.to_string());
            return;
        }
        let fm = match FrontMatter::parse(raw) {
            Ok((fm, _)) => fm,
            Err(_) => {
                self.report.missing_front_matter.push(name.to_string());
                return;
            }
        };

        match fm.get("title") {
            None => self.report.missing_title.push(name.to_string()),
            Some(value) => {
                if let Some(title) = value.as_str().filter(|t| !t.is_empty()) {
                    if !self.seen_titles.insert(title.to_string()) {
                        self.duplicates.insert(title.to_string());
                    }
                }
            }
        }

        match fm.get("date") {
            None => self.report.missing_date.push(name.to_string()),
            Some(value) => {
                if value.as_str().and_then(parse_timestamp).is_none() {
                    self.report.invalid_date.push(name.to_string());
                }
            }
        }
    }

    /// Record a file that could not be read
    pub fn unreadable(&mut self, name: &str, error: impl std::fmt::Display) {
        self.report.unreadable.push(format!("{}: {}", name, error));
    }

    pub fn finish(mut self) -> ValidationReport {
        self.report.duplicate_titles = self.duplicates.into_iter().collect();
        self.report
    }

    fn check_path(&mut self, name: &str, path: &Path) {
        match fs::read_to_string(path) {
            Ok(raw) => self.check(name, &raw),
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                self.unreadable(name, e);
            }
        }
    }
}

/// Validate every published post and every page.
///
/// Pages are reported as `<slug>/index.md`. Only a failure to list a
/// directory is an error; problems with single files end up in the report.
pub fn validate(posts: &PostRepository, pages: &PageRepository) -> Result<ValidationReport> {
    let mut validator = Validator::new();

    for path in posts.published_files()? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::debug!("Validating post {}", name);
        validator.check_path(&name, &path);
    }

    for (slug, index) in pages.page_files()? {
        let name = format!("{}/index.md", slug);
        tracing::debug!("Validating page {}", name);
        validator.check_path(&name, &index);
    }

    Ok(validator.finish())
}
