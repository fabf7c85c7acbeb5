//! Repositories - CRUD over the posts directory and the page directories
//!
//! Nothing is cached: every call reads the files again. Writers of the same
//! record are serialized through [`RecordLocks`] and every rewrite goes
//! through a temp file in the same directory followed by a rename.

mod lock;
mod pages;
mod posts;

pub use lock::{RecordGuard, RecordLocks, Revision};
pub use pages::{NewPage, PageRepository, PageUpdate};
pub use posts::{ListQuery, NewPost, PostRepository, PostUpdate};

use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{Result, WriterError};

/// Body of a freshly created record
const PLACEHOLDER: &str = "Start writing here...";

/// Marker the site builder uses to cut the excerpt
const MORE_MARKER: &str = "<!-- more -->";

/// Read a whole record, mapping a missing file to `NotFound`
fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| WriterError::from_io(path, e))
}

/// Replace `path` atomically with `content`
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let mut tmp = temp_beside(path)?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| WriterError::file(path, e))?;
    tmp.persist(path)
        .map_err(|e| WriterError::file(path, e.error))?;
    Ok(())
}

/// Write a new file, failing with `AlreadyExists` instead of clobbering
fn write_new(path: &Path, content: &str) -> Result<()> {
    let mut tmp = temp_beside(path)?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| WriterError::file(path, e))?;
    tmp.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == std::io::ErrorKind::AlreadyExists {
            WriterError::AlreadyExists(path.to_path_buf())
        } else {
            WriterError::file(path, e.error)
        }
    })?;
    Ok(())
}

/// [`write_new`] into `dir`, creating it first. A directory created here
/// is removed again if the write fails.
fn write_new_in_dir(dir: &Path, path: &Path, content: &str) -> Result<()> {
    let created = !dir.exists();
    fs::create_dir_all(dir).map_err(|e| WriterError::file(dir, e))?;

    write_new(path, content).map_err(|e| {
        if created {
            if let Err(cleanup) = fs::remove_dir_all(dir) {
                tracing::warn!("Failed to remove {:?}: {}", dir, cleanup);
            }
        }
        e
    })
}

fn temp_beside(path: &Path) -> Result<NamedTempFile> {
    let dir = path
        .parent()
        .ok_or_else(|| WriterError::InvalidArgument(format!("no parent directory: {:?}", path)))?;
    NamedTempFile::new_in(dir).map_err(|e| WriterError::from_io(dir, e))
}

/// Reject names that would escape their directory
fn check_name(name: &str, what: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(WriterError::InvalidArgument(format!(
            "invalid {}: {:?}",
            what, name
        )));
    }
    Ok(())
}

fn require_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(WriterError::InvalidArgument(
            "title must not be empty".to_string(),
        ));
    }
    check_field("title", title)?;
    Ok(title)
}

/// Front matter values are written one per line
fn check_field(key: &str, value: &str) -> Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(WriterError::InvalidArgument(format!(
            "{} must be a single line: {:?}",
            key, value
        )));
    }
    Ok(())
}

fn check_items(key: &str, items: &[String]) -> Result<()> {
    items.iter().try_for_each(|item| check_field(key, item))
}
