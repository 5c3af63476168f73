use std::sync::Arc;

use parking_lot::Mutex;
use rivulet_core::NetworkFetcher;
use rivulet_manifest::model::AdaptiveMedia;
use rivulet_timeline::{TimeInterval, TimeIntervalContainer};
use tokio::task::JoinSet;
use tracing::{debug, trace};

use crate::error::Error;

/// Fetches issued per scan pass unless configured otherwise.
pub const MAX_FETCH_INIT_PER_SCAN: usize = 4;

type BufferedCallback = Arc<dyn Fn(&TimeIntervalContainer) + Send + Sync>;

/// Drives one rendition's segment fetches toward a desired buffered
/// window.
///
/// The consumer keeps two interval containers: the fetch targets (what the
/// session wants buffered) and the confirmed buffered ranges (what fetches
/// have actually delivered). Mutating the targets re-flattens them and
/// triggers a scan pass; each pass issues at most
/// `max_fetch_init_per_scan` new fetches.
pub struct StreamConsumer {
    media: Arc<AdaptiveMedia>,
    fetcher: Arc<dyn NetworkFetcher>,
    fetch_target_ranges: TimeIntervalContainer,
    buffered_ranges: Arc<Mutex<TimeIntervalContainer>>,
    max_fetch_init_per_scan: usize,
    inflight: JoinSet<()>,
    on_buffered: Option<BufferedCallback>,
}

impl StreamConsumer {
    pub fn new(media: Arc<AdaptiveMedia>, fetcher: Arc<dyn NetworkFetcher>) -> Self {
        Self {
            media,
            fetcher,
            fetch_target_ranges: TimeIntervalContainer::new(),
            buffered_ranges: Arc::new(Mutex::new(TimeIntervalContainer::new())),
            max_fetch_init_per_scan: MAX_FETCH_INIT_PER_SCAN,
            inflight: JoinSet::new(),
            on_buffered: None,
        }
    }

    /// Override the per-pass fetch initiation cap.
    pub fn with_max_fetch_init_per_scan(mut self, max: usize) -> Self {
        self.max_fetch_init_per_scan = max;
        self
    }

    /// Invoked with the flattened buffered ranges after each successful
    /// segment fetch.
    pub fn on_buffered(&mut self, callback: impl Fn(&TimeIntervalContainer) + Send + Sync + 'static) {
        self.on_buffered = Some(Arc::new(callback));
    }

    pub fn media(&self) -> &Arc<AdaptiveMedia> {
        &self.media
    }

    pub fn fetch_target_ranges(&self) -> &TimeIntervalContainer {
        &self.fetch_target_ranges
    }

    /// Snapshot of the confirmed buffered ranges.
    pub fn buffered_ranges(&self) -> TimeIntervalContainer {
        self.buffered_ranges.lock().clone()
    }

    /// Fetch tasks still running. Finished tasks are reaped before
    /// counting, so the count drops as fetches settle even when no drain
    /// is in progress.
    pub fn in_flight_count(&mut self) -> usize {
        while self.inflight.try_join_next().is_some() {}
        self.inflight.len()
    }

    /// Replace the desired window and scan. Returns fetches issued.
    pub fn set_fetch_target_range(&mut self, range: TimeInterval) -> Result<usize, Error> {
        let mut container = TimeIntervalContainer::new();
        container.add(range);
        self.fetch_target_ranges = container.flatten();
        self.scan()
    }

    /// Widen the desired window and scan. Returns fetches issued.
    pub fn add_fetch_target_range(&mut self, range: TimeInterval) -> Result<usize, Error> {
        self.fetch_target_ranges.add(range);
        self.fetch_target_ranges = self.fetch_target_ranges.flatten();
        self.scan()
    }

    /// One scan pass: select unfetched segments overlapping any target
    /// range and issue their fetches, up to the per-pass cap.
    pub fn scan(&mut self) -> Result<usize, Error> {
        let seekable = self.media.seekable_ranges();
        if !self.fetch_target_ranges.has_overlapping_ranges_with(&seekable) {
            debug!(
                targets = ?self.fetch_target_ranges,
                "fetch targets outside the seekable window, nothing to do"
            );
            return Ok(0);
        }

        let segments = self.media.segments();
        // A half-specified or NaN time window means a malformed index;
        // refuse the whole pass rather than fetch around it.
        for segment in &segments {
            let locator = segment.locator();
            let (start, end) = (locator.start_time, locator.end_time);
            if start.is_nan() && end.is_nan() {
                continue;
            }
            if !start.is_finite() || !end.is_finite() {
                return Err(Error::InvalidSegmentDuration {
                    uri: locator.uri.to_string(),
                });
            }
        }

        let mut issued = 0;
        'targets: for target in self.fetch_target_ranges.iter() {
            for segment in &segments {
                if issued >= self.max_fetch_init_per_scan {
                    break 'targets;
                }
                let Some(interval) = segment.locator().interval() else {
                    continue;
                };
                if !interval.overlaps_with(target)
                    || segment.is_fetching()
                    || segment.is_buffered()
                {
                    continue;
                }
                let Some(flight) = segment.begin_fetch() else {
                    continue;
                };
                issued += 1;
                trace!(uri = %segment.locator().uri, "issuing segment fetch");

                let fetcher = Arc::clone(&self.fetcher);
                let buffered = Arc::clone(&self.buffered_ranges);
                let on_buffered = self.on_buffered.clone();
                self.inflight.spawn(async move {
                    if flight.run(fetcher.as_ref()).await.is_ok() {
                        let snapshot = {
                            let mut ranges = buffered.lock();
                            ranges.add(interval);
                            *ranges = ranges.flatten();
                            ranges.clone()
                        };
                        if let Some(callback) = on_buffered {
                            callback(&snapshot);
                        }
                    }
                });
            }
        }
        Ok(issued)
    }

    /// Wait for every in-flight fetch to settle.
    pub async fn drain_inflight(&mut self) {
        while self.inflight.join_next().await.is_some() {}
    }

    /// Cancel every in-flight fetch. Per-segment bookkeeping is restored
    /// by the fetch guards as the tasks unwind.
    pub async fn abort_inflight(&mut self) {
        self.inflight.abort_all();
        while self.inflight.join_next().await.is_some() {}
    }
}
