use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use rivulet_core::{FetchError, NetworkFetcher};
use tracing::debug;

use crate::model::locator::MediaLocator;

#[derive(Debug, Default)]
struct SegmentState {
    buffer: Option<Bytes>,
    is_fetching: bool,
    fetch_attempt_count: u32,
    aborted_count: u32,
}

/// One fetchable, time-bounded chunk of a rendition.
///
/// The payload is written exactly once: a buffered segment is never
/// refetched and its bytes are never mutated. Fetch lifecycle bookkeeping
/// (`is_fetching`, attempt and abort counts) lives behind a mutex so the
/// scheduler can claim a segment synchronously before spawning its fetch.
#[derive(Debug)]
pub struct MediaSegment {
    locator: MediaLocator,
    state: Mutex<SegmentState>,
}

impl MediaSegment {
    pub fn new(locator: MediaLocator) -> Self {
        Self {
            locator,
            state: Mutex::new(SegmentState::default()),
        }
    }

    pub fn locator(&self) -> &MediaLocator {
        &self.locator
    }

    /// The fetched payload, once available. Cloning `Bytes` is cheap.
    pub fn buffer(&self) -> Option<Bytes> {
        self.state.lock().buffer.clone()
    }

    pub fn is_buffered(&self) -> bool {
        self.state.lock().buffer.is_some()
    }

    pub fn is_fetching(&self) -> bool {
        self.state.lock().is_fetching
    }

    pub fn fetch_attempt_count(&self) -> u32 {
        self.state.lock().fetch_attempt_count
    }

    pub fn aborted_count(&self) -> u32 {
        self.state.lock().aborted_count
    }

    /// Claim the segment for fetching.
    ///
    /// Returns `None` when the segment is already buffered or already being
    /// fetched. The claim is taken under the lock, so two concurrent scan
    /// passes can never issue the same segment twice.
    pub fn begin_fetch(self: &Arc<Self>) -> Option<InFlightFetch> {
        let mut state = self.state.lock();
        if state.buffer.is_some() || state.is_fetching {
            return None;
        }
        state.is_fetching = true;
        state.fetch_attempt_count += 1;
        Some(InFlightFetch {
            segment: Arc::clone(self),
            armed: true,
        })
    }

    /// Claim and run a fetch in one step.
    ///
    /// `Ok(None)` means the segment needed no fetch (already buffered or
    /// in flight elsewhere).
    pub async fn fetch(
        self: &Arc<Self>,
        fetcher: &dyn NetworkFetcher,
    ) -> Result<Option<Bytes>, FetchError> {
        match self.begin_fetch() {
            Some(flight) => flight.run(fetcher).await.map(Some),
            None => Ok(None),
        }
    }
}

/// A claimed fetch on one segment.
///
/// Dropping the guard while still armed (the spawned task was canceled
/// mid-flight) clears `is_fetching` and counts an abort, so scheduler
/// bookkeeping stays correct under cancellation.
#[derive(Debug)]
pub struct InFlightFetch {
    segment: Arc<MediaSegment>,
    armed: bool,
}

impl InFlightFetch {
    pub fn segment(&self) -> &Arc<MediaSegment> {
        &self.segment
    }

    /// Perform the fetch and store the payload on success.
    pub async fn run(mut self, fetcher: &dyn NetworkFetcher) -> Result<Bytes, FetchError> {
        let locator = self.segment.locator();
        let result = fetcher
            .issue(&locator.uri, locator.byte_range.as_ref())
            .await;
        match result {
            Ok(response) => {
                let mut state = self.segment.state.lock();
                state.is_fetching = false;
                if state.buffer.is_none() {
                    state.buffer = Some(response.data.clone());
                }
                drop(state);
                self.armed = false;
                Ok(response.data)
            }
            Err(err) => {
                let mut state = self.segment.state.lock();
                state.is_fetching = false;
                if err.is_aborted() {
                    state.aborted_count += 1;
                }
                drop(state);
                self.armed = false;
                debug!(uri = %locator.uri, error = %err, "segment fetch failed");
                Err(err)
            }
        }
    }
}

impl Drop for InFlightFetch {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.segment.state.lock();
            state.is_fetching = false;
            state.aborted_count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rivulet_core::{ByteRange, FetchResponse};
    use std::sync::atomic::{AtomicU32, Ordering};
    use url::Url;

    struct StaticFetcher {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl NetworkFetcher for StaticFetcher {
        async fn issue(
            &self,
            url: &Url,
            _byte_range: Option<&ByteRange>,
        ) -> Result<FetchResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(FetchError::Transport {
                    uri: url.to_string(),
                    message: "refused".into(),
                })
            } else {
                Ok(FetchResponse::from_data(Bytes::from_static(b"payload")))
            }
        }
    }

    fn segment() -> Arc<MediaSegment> {
        let uri = Url::parse("https://cdn.example.com/seg-0.m4s").unwrap();
        Arc::new(MediaSegment::new(MediaLocator::new(uri, 0.0, 2.0, None)))
    }

    #[tokio::test]
    async fn test_buffer_is_set_exactly_once() {
        let seg = segment();
        let fetcher = StaticFetcher {
            calls: AtomicU32::new(0),
            fail: false,
        };

        let first = seg.fetch(&fetcher).await.unwrap();
        assert_eq!(first.as_deref(), Some(&b"payload"[..]));
        assert!(seg.is_buffered());
        assert_eq!(seg.fetch_attempt_count(), 1);

        // A second fetch is a no-op.
        let second = seg.fetch(&fetcher).await.unwrap();
        assert!(second.is_none());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_fetching_and_allows_retry() {
        let seg = segment();
        let failing = StaticFetcher {
            calls: AtomicU32::new(0),
            fail: true,
        };
        assert!(seg.fetch(&failing).await.is_err());
        assert!(!seg.is_fetching());
        assert!(!seg.is_buffered());
        assert_eq!(seg.aborted_count(), 0);

        let working = StaticFetcher {
            calls: AtomicU32::new(0),
            fail: false,
        };
        assert!(seg.fetch(&working).await.unwrap().is_some());
        assert_eq!(seg.fetch_attempt_count(), 2);
    }

    #[test]
    fn test_dropping_claim_counts_abort() {
        let seg = segment();
        let claim = seg.begin_fetch().unwrap();
        assert!(seg.is_fetching());
        // Second claim is refused while the first is live.
        assert!(seg.begin_fetch().is_none());

        drop(claim);
        assert!(!seg.is_fetching());
        assert_eq!(seg.aborted_count(), 1);
        // The segment is claimable again afterwards.
        assert!(seg.begin_fetch().is_some());
    }
}
