use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rivulet_manifest::model::AdaptiveMedia;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One pending index refresh per rendition.
///
/// Live content re-resolves its segment index periodically. Scheduling a
/// refresh for a rendition that already has one pending cancels and
/// replaces the earlier timer, so a rendition never has two timers racing.
#[derive(Default)]
pub struct RefreshScheduler {
    // Keyed by rendition identity (pointer), since renditions carry no
    // global id of their own.
    pending: Mutex<HashMap<usize, JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(media: &Arc<AdaptiveMedia>) -> usize {
        Arc::as_ptr(media) as usize
    }

    /// Schedule a refresh of `media` after `delay`, replacing any pending
    /// one.
    pub fn schedule(&self, media: &Arc<AdaptiveMedia>, delay: Duration) {
        let key = Self::key(media);
        let media = Arc::clone(media);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match media.refresh().await {
                Ok(added) => debug!(added, "scheduled index refresh applied"),
                Err(error) => warn!(%error, "scheduled index refresh failed"),
            }
        });
        if let Some(previous) = self.pending.lock().insert(key, handle) {
            previous.abort();
        }
    }

    /// Cancel the pending refresh for `media`, if any.
    pub fn cancel(&self, media: &Arc<AdaptiveMedia>) {
        if let Some(handle) = self.pending.lock().remove(&Self::key(media)) {
            handle.abort();
        }
    }

    /// Whether a refresh is still pending for `media`.
    pub fn is_scheduled(&self, media: &Arc<AdaptiveMedia>) -> bool {
        self.pending
            .lock()
            .get(&Self::key(media))
            .is_some_and(|h| !h.is_finished())
    }

    /// Cancel every pending refresh.
    pub fn cancel_all(&self) {
        for (_, handle) in self.pending.lock().drain() {
            handle.abort();
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
