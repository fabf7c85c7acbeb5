//! Command implementations behind the CLI

pub mod backup;
pub mod check;
pub mod page;
pub mod post;
pub mod tools;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Pretty JSON on stdout, for `--json`
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Body text given inline or as a file to read
pub fn read_content(text: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    match (text, file) {
        (Some(_), Some(_)) => anyhow::bail!("use either --content or --file, not both"),
        (Some(text), None) => Ok(Some(text)),
        (None, Some(path)) => fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read {:?}", path)),
        (None, None) => Ok(None),
    }
}
