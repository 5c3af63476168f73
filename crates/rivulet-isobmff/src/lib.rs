//! Rivulet-Isobmff: just enough ISO-BMFF to index media
//!
//! This is not a demuxer. It locates boxes by type path inside a byte
//! buffer and decodes the one box the streaming core needs to plan
//! byte-range fetches: the segment index (`sidx`).

pub mod boxes;
mod bytes;
pub mod error;
pub mod sidx;

pub use boxes::{find_boxes, BoxView, FourCc};
pub use error::Error;
pub use sidx::{SidxBox, SidxReference};

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;
