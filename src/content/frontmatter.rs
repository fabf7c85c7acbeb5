//! Front-matter parsing and writing
//!
//! The metadata block is a small line-oriented `key: value` format, not full
//! YAML:
//!
//! ```text
//! ---
//! title: Hello World
//! date: 2024-01-15 10:30:00
//! tags: [rust, hexo]
//! ---
//!
//! Body text.
//! ```
//!
//! Values wrapped in matching `'` or `"` are taken literally. `[a, b]` is a
//! list; commas inside a quoted element do not split it. Lines without a
//! colon, blank lines and `#` comments are ignored. A key is split at the
//! first colon, so `date: 2024-01-15 10:30:00` keeps its time part.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WriterError};

/// The line that opens and closes a metadata block
pub const DELIMITER: &str = "---";

/// Fields written first, in this order
pub const FIXED_FIELDS: [&str; 5] = ["title", "date", "tags", "categories", "layout"];

/// A single metadata value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// The scalar text, if this is not a list
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    /// Treat a scalar as a one-element list (Hexo accepts `tags: Notes`)
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FieldValue::Scalar(s) if s.is_empty() => Vec::new(),
            FieldValue::Scalar(s) => vec![s.clone()],
            FieldValue::List(items) => items.clone(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Scalar(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Front-matter data from a post or page, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: IndexMap<String, FieldValue>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. Re-setting an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.shift_remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Scalar value of a key
    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.str("title")
    }

    pub fn date(&self) -> Option<&str> {
        self.str("date")
    }

    pub fn layout(&self) -> Option<&str> {
        self.str("layout")
    }

    /// Tags with duplicates collapsed (first occurrence wins)
    pub fn tags(&self) -> Vec<String> {
        self.set_field("tags")
    }

    /// Categories with duplicates collapsed (first occurrence wins)
    pub fn categories(&self) -> Vec<String> {
        self.set_field("categories")
    }

    /// Posts are published unless the block says otherwise
    pub fn published(&self) -> bool {
        match self.str("published") {
            Some(v) => !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "false" | "no" | "0"
            ),
            None => true,
        }
    }

    /// Keys outside [`FIXED_FIELDS`], in file order
    pub fn extra(&self) -> IndexMap<String, FieldValue> {
        self.fields
            .iter()
            .filter(|(k, _)| !FIXED_FIELDS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn set_field(&self, key: &str) -> Vec<String> {
        let items = self.get(key).map(FieldValue::to_list).unwrap_or_default();
        items
            .into_iter()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether the text opens with a delimiter line
    pub fn has_block(raw: &str) -> bool {
        strip_opening(raw).is_some()
    }

    /// Parse front-matter from file content.
    /// Returns (front_matter, body).
    ///
    /// Text that does not open with `---` has no metadata and is all body.
    /// An opening delimiter without a closing one is a `MalformedDocument`.
    pub fn parse(raw: &str) -> Result<(Self, &str)> {
        let Some(rest) = strip_opening(raw) else {
            return Ok((FrontMatter::default(), raw));
        };

        let (block, body) = split_block(rest).ok_or_else(|| {
            WriterError::MalformedDocument("front-matter has no closing ---".to_string())
        })?;

        let mut fm = FrontMatter::default();
        for line in block.lines() {
            if let Some((key, value)) = parse_line(line) {
                fm.fields.insert(key, value);
            }
        }

        Ok((fm, body))
    }

    /// Like [`FrontMatter::parse`], but an unterminated block falls back to
    /// treating the whole text as body
    pub fn parse_lenient(raw: &str) -> (Self, &str) {
        match Self::parse(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("{}, treating the file as body only", e);
                (FrontMatter::default(), raw)
            }
        }
    }

    /// Write the block followed by a blank line and the body.
    ///
    /// The fixed fields come first in their fixed order, then every other
    /// key in insertion order.
    pub fn serialize(&self, body: &str) -> String {
        let mut out = String::with_capacity(body.len() + 128);
        out.push_str(DELIMITER);
        out.push('\n');

        for key in FIXED_FIELDS {
            if let Some(value) = self.fields.get(key) {
                write_entry(&mut out, key, value);
            }
        }
        for (key, value) in &self.fields {
            if !FIXED_FIELDS.contains(&key.as_str()) {
                write_entry(&mut out, key, value);
            }
        }

        out.push_str(DELIMITER);
        out.push_str("\n\n");
        out.push_str(body);
        out
    }
}

/// Strip the opening delimiter line, returning what follows it
fn strip_opening(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix(DELIMITER)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Find the closing delimiter line. Returns (block, body) where the body has
/// one separating blank line removed.
fn split_block(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    loop {
        let line_end = rest[offset..].find('\n').map(|i| offset + i);
        let line = &rest[offset..line_end.unwrap_or(rest.len())];

        if line.trim_end_matches('\r') == DELIMITER {
            let after = line_end.map(|e| &rest[e + 1..]).unwrap_or("");
            let body = after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after);
            return Some((&rest[..offset], body));
        }

        offset = line_end? + 1;
    }
}

fn parse_line(line: &str) -> Option<(String, FieldValue)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (key, value) = trimmed.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some((key.to_string(), parse_value(value.trim())))
}

fn parse_value(value: &str) -> FieldValue {
    if let Some(inner) = unquote(value) {
        return FieldValue::Scalar(inner.to_string());
    }

    if value.len() >= 2 && value.starts_with('[') && value.ends_with(']') {
        return FieldValue::List(split_items(&value[1..value.len() - 1]));
    }

    FieldValue::Scalar(value.to_string())
}

/// Inner text of a value wrapped in matching quotes
fn unquote(s: &str) -> Option<&str> {
    let first = s.chars().next()?;
    if s.len() >= 2 && (first == '"' || first == '\'') && s.ends_with(first) {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

/// Split array items at commas that are not inside a quoted item
fn split_items(inner: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == ',' => {
                push_item(&mut items, &current);
                current.clear();
            }
            // A quote only opens a quoted item at the start of the item
            None if (c == '"' || c == '\'') && current.trim().is_empty() => {
                quote = Some(c);
                current.push(c);
            }
            None => current.push(c),
        }
    }
    push_item(&mut items, &current);

    items
}

fn push_item(items: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    let item = unquote(trimmed).unwrap_or(trimmed);
    if !item.is_empty() {
        items.push(item.to_string());
    }
}

fn write_entry(out: &mut String, key: &str, value: &FieldValue) {
    out.push_str(key);
    out.push(':');
    match value {
        FieldValue::Scalar(s) if s.is_empty() => {}
        FieldValue::Scalar(s) => {
            out.push(' ');
            out.push_str(&render_scalar(s));
        }
        FieldValue::List(items) => {
            let rendered: Vec<String> = items
                .iter()
                .filter(|item| !item.is_empty())
                .map(|item| render_item(item))
                .collect();
            out.push_str(" [");
            out.push_str(&rendered.join(", "));
            out.push(']');
        }
    }
    out.push('\n');
}

/// Quote a scalar only when it would otherwise read back differently
fn render_scalar(s: &str) -> String {
    let looks_like_list = s.starts_with('[') && s.ends_with(']');
    if s != s.trim() || s.starts_with('"') || s.starts_with('\'') || looks_like_list {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

fn render_item(item: &str) -> String {
    let needs_quotes = item != item.trim()
        || item.contains(',')
        || item.starts_with('"')
        || item.starts_with('\'');
    if !needs_quotes {
        item.to_string()
    } else if !item.contains('\'') {
        format!("'{}'", item)
    } else {
        format!("\"{}\"", item)
    }
}
