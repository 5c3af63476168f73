use thiserror::Error;

/// Errors from box location and sidx decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read ran past the end of the buffer.
    #[error("buffer underflow: needed {need} bytes, {have} available")]
    BufferUnderflow { need: usize, have: usize },

    /// A box header advertised a size its buffer cannot hold.
    #[error("truncated box '{box_type}': declared {declared} bytes, {available} available")]
    TruncatedBox {
        box_type: String,
        declared: usize,
        available: usize,
    },

    /// A feature of the format this reader deliberately does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),
}
