//! Rivulet: the media-index and playback-sequencing core of an
//! adaptive-bitrate streaming client.
//!
//! Rivulet turns remote manifests (HLS M3U8, MPEG-DASH MPD) and binary
//! segment indices into a normalized model of fetchable, time-bounded
//! media segments, drives a deterministic playback state machine from
//! translated media-clock events, schedules segment fetches against a
//! desired buffering window, and serializes appends into a single-writer
//! media sink.
//!
//! The embedder supplies three capabilities and gets everything else from
//! the library:
//!
//! - [`NetworkFetcher`] - byte-range-capable, cancelable resource fetches
//! - [`MediaSink`] - the single-writer destination for ready-to-play bytes
//! - [`MediaClockSource`] - a snapshot view of the playback clock
//!
//! A typical session: detect the [`manifest::ManifestFormat`], parse the
//! manifest into an [`manifest::model::AdaptiveMediaPeriod`], pick a
//! rendition, point a [`session::StreamConsumer`] at the window you want
//! buffered, and feed fetched payloads through a
//! [`session::SinkAppendQueue`]. Clock events go through
//! [`playback::ReasonQueue`] into the [`playback::PlaybackStateMachine`].

pub use rivulet_isobmff as isobmff;
pub use rivulet_manifest as manifest;
pub use rivulet_playback as playback;
pub use rivulet_session as session;
pub use rivulet_timeline as timeline;

pub use rivulet_core::{
    ByteRange, ClockSnapshot, FetchError, FetchResponse, MediaClockSource, MediaSink,
    NetworkFetcher, SinkError,
};
