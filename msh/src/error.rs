//! Error types for msh

use msh_sdk::FsError;
use thiserror::Error;

/// Result type alias for msh operations
pub type MshResult<T> = Result<T, MshError>;

/// Error types for interpreter operations
#[derive(Error, Debug)]
pub enum MshError {
    /// Filesystem primitive failed
    #[error("{0}")]
    Fs(#[from] FsError),

    /// Console or host I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrong number or shape of arguments; carries the usage line
    #[error("Usage: {0}")]
    Usage(String),

    /// Arguments were well-formed but cannot be acted upon
    #[error("{0}")]
    InvalidArgument(String),

    /// Command not found
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// Script execution could not start or was aborted
    #[error("{0}")]
    Script(String),
}

impl MshError {
    pub fn usage(usage: impl Into<String>) -> Self {
        Self::Usage(usage.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
