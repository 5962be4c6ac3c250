//! Storage operation errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Owner file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to move {} -> {}: {source}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
