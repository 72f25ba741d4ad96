//! Error types for string construction.

use std::fmt;

/// Errors that can occur while building or copying strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The allocator could not provide the requested bytes.
    OutOfMemory {
        /// Size of the failed request in bytes.
        requested: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory { requested } => {
                write!(f, "Out of memory: failed to allocate {requested} bytes")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type for string operations that allocate.
pub type Result<T> = std::result::Result<T, Error>;
