//! Rivulet-Session: turning a desired window into ordered I/O
//!
//! Three pieces sit between the rendition model and the embedder:
//!
//! - [`StreamConsumer`] scans a rendition for segments overlapping the
//!   desired buffered window and issues bounded, cancelable fetches
//! - [`SinkAppendQueue`] serializes append/remove operations against a
//!   single-writer media sink
//! - [`RefreshScheduler`] keeps at most one pending index refresh per
//!   rendition for live content

pub mod consumer;
pub mod error;
pub mod refresh;
pub mod sink_queue;

pub use consumer::StreamConsumer;
pub use error::Error;
pub use refresh::RefreshScheduler;
pub use sink_queue::{SinkAppendQueue, SinkOp};

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;
