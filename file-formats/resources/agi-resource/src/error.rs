//! Error types for the AGI resource library

use std::io;
use thiserror::Error;

/// Result type alias for resource operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for resource operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad signature or malformed fixed-width record
    #[error("Invalid resource format: {0}")]
    Format(String),

    /// Declared length exceeds the bytes actually available
    #[error(
        "Truncated resource at offset {offset:#x}: declared {declared} bytes, only {available} available"
    )]
    TruncatedResource {
        /// Offset of the resource block
        offset: usize,
        /// Length claimed by the header
        declared: usize,
        /// Bytes remaining in the container
        available: usize,
    },

    /// Replacement content exceeds a fixed on-disk capacity or address width
    #[error("Capacity exceeded: {0}")]
    Overflow(String),

    /// Text cannot be represented in the on-disk charset or collation domain
    #[error("Encoding error: {0}")]
    Encoding(String),
}

impl Error {
    /// Create a new Format error
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Error::Format(msg.into())
    }

    /// Create a new Overflow error
    pub fn overflow<S: Into<String>>(msg: S) -> Self {
        Error::Overflow(msg.into())
    }

    /// Create a new Encoding error
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        Error::Encoding(msg.into())
    }

    /// Check if this error indicates a damaged container
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Format(_) | Error::TruncatedResource { .. })
    }

    /// Check if the caller can retry with adjusted input (e.g. shorter text)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Overflow(_) | Error::Encoding(_))
    }
}
