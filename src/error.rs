use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading externally supplied records.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported record file {0} (expected .csv or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Failure of a single collaborator call during a scan.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0} not available")]
    InputUnavailable(String),

    #[error(transparent)]
    Source(#[from] SourceError),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("a scan is already running")]
    AlreadyRunning,
}
