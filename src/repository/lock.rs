//! Per-record exclusive access and revision checks

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::SystemTime;

use crate::error::{Result, WriterError};

/// Registry of records currently being written.
///
/// Clones share the same registry, so every repository built from one
/// [`crate::Blog`] serializes writers of the same file.
#[derive(Debug, Clone, Default)]
pub struct RecordLocks {
    state: Arc<(Mutex<HashSet<PathBuf>>, Condvar)>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `path` is free, then hold it until the guard drops
    pub fn acquire(&self, path: &Path) -> RecordGuard {
        let (held, released) = &*self.state;
        let mut held = held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(path) {
            tracing::debug!("Waiting for lock on {:?}", path);
            held = released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(path.to_path_buf());

        RecordGuard {
            locks: self.clone(),
            path: path.to_path_buf(),
        }
    }

    pub fn is_held(&self, path: &Path) -> bool {
        let (held, _) = &*self.state;
        held.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }
}

/// Exclusive hold on one record; released on drop
#[derive(Debug)]
pub struct RecordGuard {
    locks: RecordLocks,
    path: PathBuf,
}

impl RecordGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        let (held, released) = &*self.locks.state;
        held.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
        released.notify_all();
    }
}

/// What a record looked like on disk when it was read.
///
/// Pass it back with an update to detect writes made in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    modified: SystemTime,
    len: u64,
}

impl Revision {
    pub fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| WriterError::from_io(path, e))?;
        Ok(Self {
            modified: metadata.modified()?,
            len: metadata.len(),
        })
    }

    /// Fail with `Conflict` unless the file still matches this revision
    pub fn check(&self, path: &Path) -> Result<()> {
        if Revision::of(path)? == *self {
            Ok(())
        } else {
            Err(WriterError::Conflict(path.to_path_buf()))
        }
    }
}
