//! Rivulet-Manifest: manifests in, renditions out
//!
//! Both manifest dialects populate the same model: an
//! [`AdaptiveMediaPeriod`](model::AdaptiveMediaPeriod) of media sets, each
//! holding renditions ([`AdaptiveMedia`](model::AdaptiveMedia)) whose
//! segments are learned eagerly (HLS media playlists) or lazily through a
//! segment-index provider (HLS master variants, DASH byte-ranged `sidx`
//! indices).

pub mod dash;
pub mod error;
pub mod format;
pub mod hls;
pub mod model;

pub use error::Error;
pub use format::ManifestFormat;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;
