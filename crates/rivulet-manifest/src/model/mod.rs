//! The shared rendition and segment data model both manifest formats
//! populate.

pub mod locator;
pub mod media;
pub mod period;
pub mod segment;

pub use locator::MediaLocator;
pub use media::{AdaptiveMedia, MediaInfo, SegmentIndex, SegmentIndexProvider, VideoInfo};
pub use period::{
    AdaptiveMediaPeriod, AdaptiveMediaSet, MediaType, MediaTypeSet, PeriodId, SetId,
};
pub use segment::{InFlightFetch, MediaSegment};
