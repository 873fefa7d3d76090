// Error taxonomy shared by every stage. Each kind is distinct so a caller
// can decide its own partial-failure policy; the binary simply aborts.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Malformed cache file {path}: {source}")]
    CacheParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Error uploading image {path}: {reason}")]
    Upload { path: PathBuf, reason: String },

    #[error("URL '{reference}' in {document} not found in cache. Sync images first.")]
    MissingEntry { reference: String, document: PathBuf },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn upload(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SyncError::Upload {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
