//! Runner error types

use eventload_http::HttpError;
use std::path::PathBuf;

/// Failures that stop a run before or after the load phase.
///
/// Individual request failures are never reported here.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("Invalid batch configuration: {0}")]
    InvalidBatchConfig(String),

    #[error("Event discovery failed: {0}")]
    Discovery(String),

    #[error("Request construction failed: {0}")]
    Request(#[from] HttpError),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type RunnerResult<T> = Result<T, RunnerError>;
