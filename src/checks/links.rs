//! Broken link and missing image detection

use lazy_static::lazy_static;
use percent_encoding::percent_decode_str;
use pulldown_cmark::{Event, LinkType, Parser, Tag, TagEnd};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::FrontMatter;
use crate::error::Result;
use crate::repository::PostRepository;

lazy_static! {
    static ref URL_SCHEME: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Link,
    Image,
    Unreadable,
}

/// One problem found in one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkIssue {
    pub file: String,
    pub kind: IssueKind,
    /// Link text or image alt text (the error message for unreadable files)
    pub text: String,
    pub target: String,
    /// Where the target was looked for
    pub resolved: Option<PathBuf>,
}

impl fmt::Display for LinkIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::Link => {
                write!(f, "{}: broken link - [{}]({})", self.file, self.text, self.target)
            }
            IssueKind::Image => {
                write!(f, "{}: missing image - ![{}]({})", self.file, self.text, self.target)
            }
            IssueKind::Unreadable => write!(f, "{}: unreadable - {}", self.file, self.text),
        }
    }
}

/// A link or image as written in the Markdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownLink {
    pub image: bool,
    pub text: String,
    pub target: String,
}

/// Resolves relative link targets against the corpus on disk
#[derive(Debug, Clone)]
pub struct LinkChecker {
    root: PathBuf,
}

impl LinkChecker {
    /// `root` is where `./x` and `/x` targets are looked up
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Check the body of every published post
    pub fn check_posts(&self, posts: &PostRepository) -> Result<Vec<LinkIssue>> {
        let mut issues = Vec::new();
        for path in posts.published_files()? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match fs::read_to_string(&path) {
                Ok(raw) => {
                    let (_, body) = FrontMatter::parse_lenient(&raw);
                    issues.extend(self.check_body(&name, &path, body));
                }
                Err(e) => {
                    tracing::warn!("Failed to read {:?}: {}", path, e);
                    issues.push(LinkIssue {
                        file: name,
                        kind: IssueKind::Unreadable,
                        text: e.to_string(),
                        target: String::new(),
                        resolved: None,
                    });
                }
            }
        }
        Ok(issues)
    }

    /// Check the links of one body; `file` is the file the body came from
    pub fn check_body(&self, name: &str, file: &Path, body: &str) -> Vec<LinkIssue> {
        extract_links(body)
            .into_iter()
            .filter_map(|link| {
                let resolved = self.resolve(file, &link.target)?;
                if resolved.exists() {
                    return None;
                }
                tracing::debug!("{}: {:?} does not exist", name, resolved);
                Some(LinkIssue {
                    file: name.to_string(),
                    kind: if link.image {
                        IssueKind::Image
                    } else {
                        IssueKind::Link
                    },
                    text: link.text,
                    target: link.target,
                    resolved: Some(resolved),
                })
            })
            .collect()
    }

    /// Where a target points on disk; `None` for external and in-page links
    pub fn resolve(&self, file: &Path, target: &str) -> Option<PathBuf> {
        let target = target.trim();
        if target.is_empty()
            || target.starts_with('#')
            || target.starts_with("//")
            || URL_SCHEME.is_match(target)
        {
            return None;
        }

        let path_part = target.split(['#', '?']).next().unwrap_or_default();
        if path_part.is_empty() {
            return None;
        }
        let decoded = percent_decode_str(path_part).decode_utf8_lossy();

        let resolved = if let Some(rest) = decoded.strip_prefix("./") {
            self.root.join(rest)
        } else if let Some(rest) = decoded.strip_prefix('/') {
            self.root.join(rest)
        } else {
            file.parent().unwrap_or(Path::new("")).join(&*decoded)
        };
        Some(resolved)
    }
}

/// Inline links and images in document order, nested ones included.
/// Autolinks (`<https://...>`) and e-mail links are left out.
pub fn extract_links(body: &str) -> Vec<MarkdownLink> {
    let mut links = Vec::new();
    let mut open: Vec<MarkdownLink> = Vec::new();

    for event in Parser::new(body) {
        match event {
            Event::Start(Tag::Link {
                link_type, dest_url, ..
            }) => open.push(MarkdownLink {
                image: false,
                text: String::new(),
                target: keep_unless_auto(link_type, &dest_url),
            }),
            Event::Start(Tag::Image { dest_url, .. }) => open.push(MarkdownLink {
                image: true,
                text: String::new(),
                target: dest_url.to_string(),
            }),
            Event::Text(text) | Event::Code(text) => {
                if let Some(link) = open.last_mut() {
                    link.text.push_str(&text);
                }
            }
            Event::End(TagEnd::Link) | Event::End(TagEnd::Image) => {
                if let Some(link) = open.pop() {
                    if !link.target.is_empty() {
                        links.push(link);
                    }
                }
            }
            _ => {}
        }
    }

    links
}

fn keep_unless_auto(link_type: LinkType, dest: &str) -> String {
    match link_type {
        LinkType::Autolink | LinkType::Email => String::new(),
        _ => dest.to_string(),
    }
}
