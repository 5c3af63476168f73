use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;
use parking_lot::RwLock;
use rivulet_timeline::TimeIntervalContainer;
use tracing::debug;

use crate::error::Error;
use crate::model::period::SetId;
use crate::model::segment::MediaSegment;

/// Resolution advertised for a video rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
}

/// Static metadata describing one rendition.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    pub bandwidth: Option<u64>,
    pub codecs: Option<String>,
    pub video: Option<VideoInfo>,
    pub label: Option<String>,
}

/// The result of resolving a rendition's segment index.
#[derive(Debug, Default)]
pub struct SegmentIndex {
    pub segments: Vec<Arc<MediaSegment>>,
    /// Whether the index is final (VOD, or a live stream that has ended).
    pub ended: bool,
}

/// A deferred segment-index resolver.
///
/// Master-playlist variants and DASH representations both learn their
/// segments lazily: the provider fetches and parses the variant's own
/// playlist or byte-ranged index when invoked.
pub type SegmentIndexProvider =
    Arc<dyn Fn() -> BoxFuture<'static, Result<SegmentIndex, Error>> + Send + Sync>;

/// One rendition: an ordered, append-only sequence of media segments plus
/// the metadata an ABR policy would select on.
///
/// Belongs to at most one [`AdaptiveMediaSet`](crate::model::period::AdaptiveMediaSet);
/// the parent link is an id set exactly once, never an owning reference.
pub struct AdaptiveMedia {
    info: MediaInfo,
    segments: RwLock<Vec<Arc<MediaSegment>>>,
    seekable: RwLock<Option<TimeIntervalContainer>>,
    provider: RwLock<Option<SegmentIndexProvider>>,
    ended: AtomicBool,
    parent: OnceLock<SetId>,
}

impl AdaptiveMedia {
    pub fn new(info: MediaInfo) -> Self {
        Self {
            info,
            segments: RwLock::new(Vec::new()),
            seekable: RwLock::new(None),
            provider: RwLock::new(None),
            ended: AtomicBool::new(false),
            parent: OnceLock::new(),
        }
    }

    pub fn info(&self) -> &MediaInfo {
        &self.info
    }

    pub fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }

    pub fn set_ended(&self, ended: bool) {
        self.ended.store(ended, Ordering::Release);
    }

    pub fn parent_set(&self) -> Option<SetId> {
        self.parent.get().copied()
    }

    pub(crate) fn attach_to_set(&self, set: SetId) -> Result<(), Error> {
        self.parent.set(set).map_err(|_| Error::AlreadyParented)
    }

    /// Snapshot of the current segment sequence.
    pub fn segments(&self) -> Vec<Arc<MediaSegment>> {
        self.segments.read().clone()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// Append segments not already present, keyed by URI and byte range.
    ///
    /// The sequence is append-only so in-flight fetches and buffered
    /// payloads survive a live index refresh. Returns how many segments
    /// were actually added.
    pub fn push_segments(&self, incoming: Vec<Arc<MediaSegment>>) -> usize {
        let mut segments = self.segments.write();
        let mut added = 0;
        for segment in incoming {
            let exists = segments.iter().any(|s| {
                s.locator().uri == segment.locator().uri
                    && s.locator().byte_range == segment.locator().byte_range
            });
            if !exists {
                segments.push(segment);
                added += 1;
            }
        }
        drop(segments);
        if added > 0 {
            *self.seekable.write() = None;
        }
        added
    }

    pub fn set_segment_index_provider(&self, provider: SegmentIndexProvider) {
        *self.provider.write() = Some(provider);
    }

    pub fn has_segment_index_provider(&self) -> bool {
        self.provider.read().is_some()
    }

    /// Resolve the segment index through the attached provider and fold
    /// the result into the rendition.
    ///
    /// Returns how many new segments the refresh contributed.
    pub async fn refresh(&self) -> Result<usize, Error> {
        let provider = self
            .provider
            .read()
            .clone()
            .ok_or(Error::NoSegmentIndexProvider)?;
        let index = provider().await?;
        self.set_ended(index.ended);
        let added = self.push_segments(index.segments);
        debug!(
            added,
            total = self.segment_count(),
            ended = self.is_ended(),
            "segment index refreshed"
        );
        Ok(added)
    }

    /// The rendition's seekable window: the flattened union of its timed
    /// segment intervals. Cached until the segment sequence changes.
    pub fn seekable_ranges(&self) -> TimeIntervalContainer {
        if let Some(cached) = self.seekable.read().as_ref() {
            return cached.clone();
        }
        let mut container = TimeIntervalContainer::new();
        for segment in self.segments.read().iter() {
            if let Some(interval) = segment.locator().interval() {
                container.add(interval);
            }
        }
        let flat = container.flatten();
        *self.seekable.write() = Some(flat.clone());
        flat
    }
}

impl std::fmt::Debug for AdaptiveMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveMedia")
            .field("info", &self.info)
            .field("segments", &self.segments.read().len())
            .field("ended", &self.is_ended())
            .finish_non_exhaustive()
    }
}
