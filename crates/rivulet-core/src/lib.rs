//! Rivulet-Core: collaborator capabilities and shared value types
//!
//! The streaming core never touches a concrete platform type (media element,
//! media source buffer, HTTP client). Everything it needs from the outside
//! world is expressed here as a capability trait the embedder implements:
//!
//! - [`NetworkFetcher`] - cancelable, byte-range-capable resource fetches
//! - [`MediaSink`] - a single-writer destination for ready-to-play bytes
//! - [`MediaClockSource`] - a snapshot view of the playback clock
//!
//! [`ByteRange`] lives here because both the fetcher contract and the
//! manifest model speak in byte windows.

pub mod byte_range;
pub mod clock;
pub mod fetch;
pub mod sink;

pub use byte_range::ByteRange;
pub use clock::{ClockSnapshot, MediaClockSource};
pub use fetch::{FetchError, FetchResponse, NetworkFetcher};
pub use sink::{MediaSink, SinkError};
