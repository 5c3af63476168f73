//! Media sink capability.

use bytes::Bytes;
use thiserror::Error;

/// Failure starting a sink operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The sink already has an in-flight mutating operation.
    ///
    /// Busy-ness is backpressure, not a fault: queued operations simply wait.
    #[error("sink is busy")]
    Busy,

    /// The sink rejected the operation outright.
    #[error("sink rejected operation: {0}")]
    Rejected(String),
}

/// A single-writer destination for ready-to-play media bytes.
///
/// The sink permits at most one in-flight mutating operation. `append` and
/// `remove` *start* an operation; completion is signaled out-of-band by the
/// embedder (update-end), which forwards it to the append queue. `busy`
/// reflects whether an operation is still in flight.
pub trait MediaSink: Send + Sync {
    /// Start appending `data` at the given timestamp offset (seconds).
    fn append(&self, data: &Bytes, timestamp_offset: f64) -> Result<(), SinkError>;

    /// Start removing the time window `[start, end)` (seconds).
    fn remove(&self, start: f64, end: f64) -> Result<(), SinkError>;

    /// Abort the in-flight operation, if any.
    fn abort(&self);

    /// Whether a mutating operation is currently in flight.
    fn busy(&self) -> bool;
}
