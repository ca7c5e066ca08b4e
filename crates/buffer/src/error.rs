//! Error types for buffer operations.

use thiserror::Error;

/// Errors from growing or inserting into a [`GrowableBuffer`](crate::GrowableBuffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Storage could not be obtained.
    #[error("failed to allocate {bytes} bytes of buffer storage")]
    AllocationFailure {
        /// Size of the allocation that failed.
        bytes: usize,
    },

    /// The element count would overflow `usize`.
    #[error("inserting {count} elements into a buffer of {len} overflows the length")]
    Overflow {
        /// Length before the insertion.
        len: usize,
        /// Number of elements being inserted.
        count: usize,
    },

    /// The element count would exceed the buffer's maximum.
    #[error("buffer length {requested} exceeds maximum {max}")]
    CapacityExceeded {
        /// Length the insertion would produce.
        requested: usize,
        /// Largest length the buffer accepts.
        max: usize,
    },

    /// Insertion position lies past the end.
    #[error("insert position {pos} is past the end of a buffer of length {len}")]
    InvalidPosition {
        /// Requested position.
        pos: usize,
        /// Current length.
        len: usize,
    },
}
