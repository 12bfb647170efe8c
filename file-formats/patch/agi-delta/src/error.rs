//! Error types for delta patches

use std::io;
use thiserror::Error;

/// Result type alias for patch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building, reading or applying patches
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed patch artifact
    #[error("Invalid patch format: {0}")]
    Format(String),

    /// The patch does not describe the file it is applied to
    #[error("Patch mismatch: {0}")]
    PatchMismatch(String),
}

impl Error {
    /// Create a new Format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a new PatchMismatch error
    pub fn mismatch<S: Into<String>>(msg: S) -> Self {
        Error::PatchMismatch(msg.into())
    }

    /// Check if the patch artifact itself is damaged
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}
