//! Error type shared by the host-side buffers and the GL upload path.

use thiserror::Error;

/// Failures surfaced by [`LineStrip`](crate::LineStrip) and its buffers.
#[derive(Debug, Error)]
pub enum LineStripError {
    /// An argument was malformed independent of any buffer state.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An index or index range falls outside what the strip can address.
    #[error("Index {index} out of range: {reason}")]
    Index {
        /// The offending index (or the start of the offending range).
        index: usize,
        /// What made it out of range.
        reason: &'static str,
    },

    /// Host memory or a GL object could not be obtained.
    #[error("Allocation of {what} failed: {reason}")]
    AllocationFailure {
        /// Which buffer was being allocated.
        what: &'static str,
        /// The allocator's or driver's explanation.
        reason: String,
    },

    /// The strip (or one of its buffers) was already disposed.
    #[error("{0} used after dispose")]
    Disposed(&'static str),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LineStripError>;
