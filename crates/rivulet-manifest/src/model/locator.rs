use rivulet_core::ByteRange;
use rivulet_timeline::TimeInterval;
use url::Url;

use crate::error::Error;

/// Identity of one fetchable chunk: a URI, an optional byte window and an
/// optional time window.
///
/// Time bounds are `NAN` when the chunk is not time-bound (init segments,
/// index segments). `NAN` deliberately stays distinguishable from zero so
/// downstream validation can abort on unknown durations.
#[derive(Debug, Clone)]
pub struct MediaLocator {
    pub uri: Url,
    /// Presentation start in seconds, `NAN` when untimed.
    pub start_time: f64,
    /// Presentation end in seconds, `NAN` when untimed.
    pub end_time: f64,
    pub byte_range: Option<ByteRange>,
}

impl MediaLocator {
    pub fn new(uri: Url, start_time: f64, end_time: f64, byte_range: Option<ByteRange>) -> Self {
        Self {
            uri,
            start_time,
            end_time,
            byte_range,
        }
    }

    /// A locator with no time window.
    pub fn untimed(uri: Url, byte_range: Option<ByteRange>) -> Self {
        Self::new(uri, f64::NAN, f64::NAN, byte_range)
    }

    /// Resolve `relative` against `base` (typically the manifest's own URL).
    pub fn from_relative_uri(
        base: &Url,
        relative: &str,
        start_time: f64,
        end_time: f64,
        byte_range: Option<ByteRange>,
    ) -> Result<Self, Error> {
        let uri = base.join(relative)?;
        Ok(Self::new(uri, start_time, end_time, byte_range))
    }

    /// Whether the locator carries a usable time window.
    pub fn is_timed(&self) -> bool {
        self.start_time.is_finite() && self.end_time.is_finite()
    }

    /// The locator's time window, when timed and well-formed.
    pub fn interval(&self) -> Option<TimeInterval> {
        if !self.is_timed() {
            return None;
        }
        TimeInterval::new(self.start_time, self.end_time).ok()
    }
}
