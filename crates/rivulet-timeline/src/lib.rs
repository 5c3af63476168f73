//! Rivulet-Timeline: interval algebra over seconds
//!
//! Buffered media, fetch targets, and seekable windows are all sets of
//! half-open time intervals. This crate provides the two types everything
//! else builds on:
//!
//! - [`TimeInterval`] - a single `[start, end]` window with overlap, touch,
//!   merge, and gap operations
//! - [`TimeIntervalContainer`] - an ordered collection that can flatten
//!   itself into disjoint, non-touching intervals

pub mod container;
pub mod error;
pub mod interval;

pub use container::TimeIntervalContainer;
pub use error::Error;
pub use interval::TimeInterval;

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, Error>;
