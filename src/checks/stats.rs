//! Corpus-wide counters

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::Result;
use crate::helpers::{format_timestamp, parse_timestamp};
use crate::repository::{PageRepository, PostRepository};

lazy_static! {
    static ref IMAGE: Regex = Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap();
    static ref LINK: Regex = Regex::new(r"\[[^\]]*\]\([^)]*\)").unwrap();
    static ref MARKUP: Regex = Regex::new(r"[#*`\[\]()]").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlogStats {
    pub total_posts: usize,
    pub total_pages: usize,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub word_count: usize,
    /// Most recent valid post date
    pub last_updated: Option<String>,
}

/// Aggregate over published posts; pages only contribute their count
pub fn collect(posts: &PostRepository, pages: &PageRepository) -> Result<BlogStats> {
    let mut tags = BTreeSet::new();
    let mut categories = BTreeSet::new();
    let mut words = 0;
    let mut latest: Option<NaiveDateTime> = None;

    let records = posts.load_published()?;
    for post in &records {
        tags.extend(post.tags.iter().cloned());
        categories.extend(post.categories.iter().cloned());
        words += word_count(&post.body);

        if let Some(date) = post.date.as_deref().and_then(parse_timestamp) {
            if latest.map_or(true, |l| date > l) {
                latest = Some(date);
            }
        }
    }

    let stats = BlogStats {
        total_posts: records.len(),
        total_pages: pages.page_files()?.len(),
        tags: tags.into_iter().collect(),
        categories: categories.into_iter().collect(),
        word_count: words,
        last_updated: latest.as_ref().map(format_timestamp),
    };
    tracing::debug!("Stats: {:?}", stats);
    Ok(stats)
}

/// Whitespace-separated words once markup characters, then images and links
/// are gone. With the brackets stripped first, link text and target run
/// together and count as words.
pub fn word_count(body: &str) -> usize {
    let text = MARKUP.replace_all(body, "");
    let text = IMAGE.replace_all(&text, "");
    let text = LINK.replace_all(&text, "");
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::SlugStyle;
    use crate::helpers::Clock;
    use crate::repository::RecordLocks;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("# Title\n\nHello *big* world"), 4);
        // see !a catcat.png and the docsx.md now
        assert_eq!(word_count("see ![a cat](cat.png) and [the docs](x.md) now"), 7);
        assert_eq!(word_count("[the docs](x.md)"), 2);
        assert_eq!(word_count("`code` ( ) #"), 1);
    }

    #[test]
    fn test_collect() {
        let dir = TempDir::new().unwrap();
        let posts_dir = dir.path().join("_posts");
        fs::create_dir_all(&posts_dir).unwrap();
        fs::write(
            posts_dir.join("a.md"),
            "---\ntitle: A\ndate: 2024-01-01 00:00:00\ntags: [rust, web]\ncategories: [tech]\n---\n\none two three\n",
        )
        .unwrap();
        fs::write(
            posts_dir.join("b.md"),
            "---\ntitle: B\ndate: 2024-03-01 08:00:00\ntags: [rust]\n---\n\nfour\n",
        )
        .unwrap();
        fs::write(
            posts_dir.join("c.md"),
            "---\ntitle: C\ndate: someday\ntags: [zzz]\n---\n\nfive six\n",
        )
        .unwrap();
        fs::write(
            posts_dir.join("draft-d.md"),
            "---\ntitle: D\ndate: 2025-01-01 00:00:00\ntags: [hidden]\n---\n\nnope\n",
        )
        .unwrap();
        fs::create_dir_all(dir.path().join("about")).unwrap();
        fs::write(dir.path().join("about/index.md"), "---\ntitle: About\n---\n\n").unwrap();

        let locks = RecordLocks::new();
        let posts = PostRepository::new(posts_dir, Clock::Local, SlugStyle::Unicode, locks.clone());
        let pages = PageRepository::new(
            dir.path().to_path_buf(),
            Clock::Local,
            SlugStyle::Unicode,
            locks,
        );

        let stats = collect(&posts, &pages).unwrap();
        assert_eq!(stats.total_posts, 3);
        assert_eq!(stats.total_pages, 1);
        assert_eq!(stats.tags, vec!["rust", "web", "zzz"]);
        assert_eq!(stats.categories, vec!["tech"]);
        assert_eq!(stats.word_count, 6);
        assert_eq!(stats.last_updated.as_deref(), Some("2024-03-01 08:00:00"));
    }
}
