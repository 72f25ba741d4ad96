//! Error types for allocator construction.
//!
//! Running out of space during allocation is not an error in this crate: it
//! is reported as `None` by [`Allocator::alloc`](crate::Allocator::alloc).
//! The variants below cover setting up backing storage and allocators.

use std::fmt;

/// Errors that can occur while creating buffers and allocators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid alignment specified.
    InvalidAlignment {
        /// The requested alignment.
        alignment: usize,
    },

    /// The platform allocator could not provide backing storage.
    BufferAllocationFailed {
        /// The requested buffer size.
        size: usize,
    },

    /// Pool nodes must be able to hold a free-list link.
    NodeTooSmall {
        /// The node size after rounding up to the node alignment.
        node_size: usize,
        /// The smallest acceptable node size.
        minimum: usize,
    },

    /// The pool buffer cannot hold even a single node.
    BufferTooSmall {
        /// Usable bytes after aligning the buffer start.
        capacity: usize,
        /// The node size after rounding up to the node alignment.
        node_size: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAlignment { alignment } => {
                write!(
                    f,
                    "Invalid alignment: {alignment} is not a power of two"
                )
            }
            Error::BufferAllocationFailed { size } => {
                write!(f, "Failed to allocate buffer of size {size} bytes")
            }
            Error::NodeTooSmall { node_size, minimum } => {
                write!(
                    f,
                    "Pool node size {node_size} is too small, minimum is {minimum} bytes"
                )
            }
            Error::BufferTooSmall {
                capacity,
                node_size,
            } => {
                write!(
                    f,
                    "Pool buffer of {capacity} bytes cannot hold a node of {node_size} bytes"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type for allocator construction.
pub type Result<T> = std::result::Result<T, Error>;
