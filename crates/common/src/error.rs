//! Central error type for the demuxer (thiserror-based).

use thiserror::Error;

/// Errors surfaced by composition parsing and playback.
///
/// `Eof` doubles as the end-of-composition signal from packet reads and the
/// result of interrupt-driven cancellation.
#[derive(Error, Debug)]
pub enum ImfError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Allocation failure reported by a host collaborator.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The scheduler found no resource for a non-terminal composition
    /// timestamp: the declared track duration and resource list disagree.
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    #[error("end of composition")]
    Eof,
}

impl ImfError {
    /// Convenience constructor for [`ImfError::InvalidData`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        ImfError::InvalidData(reason.into())
    }
}

/// Convenience Result type for demuxer operations.
pub type ImfResult<T> = Result<T, ImfError>;
