use achminup_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("File deleted during processing: {0}")]
    DeletedDuringProcessing(String),

    #[error("Failed to execute {program}: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status}")]
    ToolFailed { program: String, status: String },

    #[error("No processor registered for {0}")]
    UnsupportedFormat(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;
