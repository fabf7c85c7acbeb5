//! Post and Page models

use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::{FieldValue, FrontMatter};

/// Filename prefix that hides a post from every read-side scan
pub const DRAFT_PREFIX: &str = "draft-";

/// A blog post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    /// File name inside the posts directory (`2024-01-01-hello.md`)
    pub filename: String,

    /// Full source file path
    pub path: PathBuf,

    /// Post title (the file stem when the metadata has none)
    pub title: String,

    /// `YYYY-MM-DD HH:MM:SS`, as written in the file
    pub date: Option<String>,

    /// Post tags
    pub tags: Vec<String>,

    /// Post categories
    pub categories: Vec<String>,

    /// Layout template to use
    pub layout: String,

    /// Whether the post is published
    pub published: bool,

    /// Raw markdown body
    pub body: String,

    /// Custom front-matter fields
    pub extra: IndexMap<String, FieldValue>,
}

impl Post {
    /// Build a post from file content, tolerating a broken metadata block
    pub fn from_source(path: &Path, raw: &str) -> Self {
        let (fm, body) = FrontMatter::parse_lenient(raw);
        let filename = file_name(path);
        let title = fm
            .title()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| file_stem(path));

        Self {
            filename,
            path: path.to_path_buf(),
            title,
            date: fm.date().filter(|d| !d.is_empty()).map(str::to_string),
            tags: fm.tags(),
            categories: fm.categories(),
            layout: fm.layout().unwrap_or("post").to_string(),
            published: fm.published(),
            body: body.to_string(),
            extra: fm.extra(),
        }
    }

    pub fn is_draft(&self) -> bool {
        is_draft_name(&self.filename)
    }
}

/// A standalone page (`<slug>/index.md`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    /// Directory name under the pages root
    pub slug: String,

    /// Full path of the page's index.md
    pub path: PathBuf,

    /// Page title (the slug when the metadata has none)
    pub title: String,

    pub date: Option<String>,

    pub layout: String,

    pub published: bool,

    /// Raw markdown body
    pub body: String,

    /// Custom front-matter fields
    pub extra: IndexMap<String, FieldValue>,
}

impl Page {
    pub fn from_source(slug: &str, path: &Path, raw: &str) -> Self {
        let (fm, body) = FrontMatter::parse_lenient(raw);
        let title = fm
            .title()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| slug.to_string());

        Self {
            slug: slug.to_string(),
            path: path.to_path_buf(),
            title,
            date: fm.date().filter(|d| !d.is_empty()).map(str::to_string),
            layout: fm.layout().unwrap_or("page").to_string(),
            published: fm.published(),
            body: body.to_string(),
            extra: fm.extra(),
        }
    }
}

/// A post matching a search, with up to three matching lines
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub post: Post,
    pub matches: Vec<String>,
}

pub fn is_draft_name(filename: &str) -> bool {
    filename.starts_with(DRAFT_PREFIX)
}

/// Newest first by date string; records without a date go last, ties by name
pub fn newest_first(
    a_date: Option<&str>,
    a_name: &str,
    b_date: Option<&str>,
    b_name: &str,
) -> Ordering {
    let by_date = match (a_date, b_date) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| a_name.cmp(b_name))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled")
        .to_string()
}
