//! Title to slug conversion

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s-]").unwrap();
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[-\s]+").unwrap();
}

/// How titles are turned into file and directory names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugStyle {
    /// Keep any Unicode letters and digits (`你好-world`)
    #[default]
    Unicode,
    /// Transliterate to ASCII first (`ni-hao-world`)
    Ascii,
}

impl SlugStyle {
    pub fn slugify(self, title: &str) -> String {
        match self {
            SlugStyle::Unicode => slugify(title),
            SlugStyle::Ascii => slugify(&::slug::slugify(title)),
        }
    }
}

/// Derive a slug from a title.
///
/// Lowercases, drops everything that is not a word character, whitespace or
/// hyphen, collapses whitespace/hyphen runs into one hyphen and trims hyphens
/// from both ends.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, "");
    let joined = SEPARATOR_RUN.replace_all(&cleaned, "-");
    joined.trim_matches('-').to_string()
}
