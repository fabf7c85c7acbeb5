//! Error types shared by the content store, the checks and the external tools

use std::path::PathBuf;
use thiserror::Error;

/// Everything the library can fail with.
///
/// Callers branch on the variant; the messages are for humans only.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Modified since it was read: {}", .0.display())]
    Conflict(PathBuf),

    #[error("IO error on {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Config error: {0}")]
    Config(String),
}

impl WriterError {
    /// Wrap an IO error together with the path it happened on
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WriterError::File {
            path: path.into(),
            source,
        }
    }

    /// Map an IO error on `path`, turning `NotFound` into the typed variant
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            WriterError::NotFound(path)
        } else {
            WriterError::file(path, source)
        }
    }
}

pub type Result<T> = std::result::Result<T, WriterError>;
