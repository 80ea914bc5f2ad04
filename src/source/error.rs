//! Errors raised while reading a platform export.
//!
//! These are all fatal for a run. Record-level problems never surface here;
//! they are counted in [`crate::diagnostics::IngestStats`] instead.

use std::path::PathBuf;

/// Fatal ingestion errors.
#[derive(Debug)]
pub enum SourceError {
    /// The export file or directory does not exist
    NotFound(PathBuf),
    /// The export exists but could not be read
    Io { path: PathBuf, message: String },
    /// The document is not the structure the adapter expects
    Malformed { path: PathBuf, message: String },
}

impl SourceError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            SourceError::NotFound(path)
        } else {
            SourceError::Io {
                path,
                message: err.to_string(),
            }
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        SourceError::Malformed {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::NotFound(path) => write!(f, "{} not found", path.display()),
            SourceError::Io { path, message } => {
                write!(f, "could not read {}: {message}", path.display())
            }
            SourceError::Malformed { path, message } => {
                write!(f, "could not parse {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for SourceError {}
