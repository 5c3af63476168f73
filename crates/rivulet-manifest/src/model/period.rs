use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};

use crate::error::Error;
use crate::model::media::AdaptiveMedia;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identity of an [`AdaptiveMediaSet`]. Children reference their parent by
/// id, never by owning pointer, so the model stays cycle-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetId(u64);

/// Identity of an [`AdaptiveMediaPeriod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodId(u64);

/// Broad content categories a set can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Video,
    Text,
}

impl MediaType {
    /// Map a manifest `contentType`/`mimeType` value to a media type.
    pub fn from_content_type(value: &str) -> Option<MediaType> {
        let value = value.to_ascii_lowercase();
        if value.contains("audio") {
            Some(MediaType::Audio)
        } else if value.contains("video") {
            Some(MediaType::Video)
        } else if value.contains("text") || value.contains("subtitle") {
            Some(MediaType::Text)
        } else {
            None
        }
    }
}

/// A small set of [`MediaType`] flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaTypeSet {
    pub audio: bool,
    pub video: bool,
    pub text: bool,
}

impl MediaTypeSet {
    pub fn insert(&mut self, media_type: MediaType) {
        match media_type {
            MediaType::Audio => self.audio = true,
            MediaType::Video => self.video = true,
            MediaType::Text => self.text = true,
        }
    }

    pub fn contains(&self, media_type: MediaType) -> bool {
        match media_type {
            MediaType::Audio => self.audio,
            MediaType::Video => self.video,
            MediaType::Text => self.text,
        }
    }

    pub fn intersects(&self, other: &MediaTypeSet) -> bool {
        (self.audio && other.audio) || (self.video && other.video) || (self.text && other.text)
    }

    pub fn is_empty(&self) -> bool {
        !(self.audio || self.video || self.text)
    }
}

/// A uniqueness set of renditions sharing a content-type combination.
pub struct AdaptiveMediaSet {
    id: SetId,
    types: Mutex<MediaTypeSet>,
    media: RwLock<Vec<Arc<AdaptiveMedia>>>,
    parent: OnceLock<PeriodId>,
}

impl Default for AdaptiveMediaSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveMediaSet {
    pub fn new() -> Self {
        Self {
            id: SetId(next_id()),
            types: Mutex::new(MediaTypeSet::default()),
            media: RwLock::new(Vec::new()),
            parent: OnceLock::new(),
        }
    }

    pub fn id(&self) -> SetId {
        self.id
    }

    pub fn parent_period(&self) -> Option<PeriodId> {
        self.parent.get().copied()
    }

    pub(crate) fn attach_to_period(&self, period: PeriodId) -> Result<(), Error> {
        self.parent.set(period).map_err(|_| Error::AlreadyParented)
    }

    pub fn insert_media_type(&self, media_type: MediaType) {
        self.types.lock().insert(media_type);
    }

    pub fn media_types(&self) -> MediaTypeSet {
        *self.types.lock()
    }

    /// Add a rendition, claiming it for this set.
    ///
    /// Re-adding a rendition already in this set is a no-op; a rendition
    /// already claimed by another set is rejected.
    pub fn add_media(&self, media: &Arc<AdaptiveMedia>) -> Result<(), Error> {
        let mut list = self.media.write();
        if list.iter().any(|m| Arc::ptr_eq(m, media)) {
            return Ok(());
        }
        media.attach_to_set(self.id)?;
        list.push(Arc::clone(media));
        Ok(())
    }

    pub fn media(&self) -> Vec<Arc<AdaptiveMedia>> {
        self.media.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.media.read().is_empty()
    }
}

/// Root of one manifest's timeline: an ordered list of media sets.
pub struct AdaptiveMediaPeriod {
    id: PeriodId,
    sets: RwLock<Vec<Arc<AdaptiveMediaSet>>>,
}

impl Default for AdaptiveMediaPeriod {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveMediaPeriod {
    pub fn new() -> Self {
        Self {
            id: PeriodId(next_id()),
            sets: RwLock::new(Vec::new()),
        }
    }

    pub fn id(&self) -> PeriodId {
        self.id
    }

    /// Add a set, claiming it for this period.
    pub fn add_set(&self, set: &Arc<AdaptiveMediaSet>) -> Result<(), Error> {
        let mut sets = self.sets.write();
        if sets.iter().any(|s| Arc::ptr_eq(s, set)) {
            return Ok(());
        }
        set.attach_to_period(self.id)?;
        sets.push(Arc::clone(set));
        Ok(())
    }

    pub fn sets(&self) -> Vec<Arc<AdaptiveMediaSet>> {
        self.sets.read().clone()
    }

    /// Sets whose content types intersect the requested combination.
    pub fn filter_by_media_types(&self, wanted: &MediaTypeSet) -> Vec<Arc<AdaptiveMediaSet>> {
        self.sets
            .read()
            .iter()
            .filter(|s| s.media_types().intersects(wanted))
            .cloned()
            .collect()
    }

    /// The first rendition of the first set, the default before any ABR
    /// policy has spoken.
    pub fn default_media(&self) -> Option<Arc<AdaptiveMedia>> {
        self.sets
            .read()
            .iter()
            .flat_map(|s| s.media())
            .next()
    }
}
