//! End-to-end wiring: manifest in, ordered sink appends out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rivulet::manifest::format::ManifestFormat;
use rivulet::manifest::hls::parse_playlist;
use rivulet::playback::{MediaClockEvent, PlaybackState, PlaybackStateMachine, ReasonQueue};
use rivulet::session::{SinkAppendQueue, StreamConsumer};
use rivulet::timeline::TimeInterval;
use rivulet::{ByteRange, FetchError, FetchResponse, MediaSink, NetworkFetcher, SinkError};
use url::Url;

const MASTER: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-STREAM-INF:BANDWIDTH=1280000,CODECS=\"avc1.42c01e,mp4a.40.2\",RESOLUTION=854x480\n\
low/playlist.m3u8\n";

const MEDIA: &str = "#EXTM3U\n\
#EXT-X-VERSION:3\n\
#EXT-X-TARGETDURATION:2\n\
#EXT-X-MEDIA-SEQUENCE:0\n\
#EXTINF:2.0,\n\
seg-0.ts\n\
#EXTINF:2.0,\n\
seg-1.ts\n\
#EXTINF:2.0,\n\
seg-2.ts\n\
#EXT-X-ENDLIST\n";

/// Serves the playlists by path and opaque payloads for segments.
struct CdnFetcher {
    fetched: Mutex<Vec<String>>,
}

#[async_trait]
impl NetworkFetcher for CdnFetcher {
    async fn issue(
        &self,
        url: &Url,
        _byte_range: Option<&ByteRange>,
    ) -> Result<FetchResponse, FetchError> {
        self.fetched.lock().unwrap().push(url.path().to_string());
        let body: Bytes = if url.path().ends_with("playlist.m3u8") {
            Bytes::from_static(MEDIA.as_bytes())
        } else {
            Bytes::from(format!("payload:{}", url.path()))
        };
        Ok(FetchResponse::from_data(body))
    }
}

#[derive(Default)]
struct SingleWriterSink {
    busy: AtomicBool,
    appends: Mutex<Vec<Bytes>>,
}

impl SingleWriterSink {
    fn complete(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl MediaSink for SingleWriterSink {
    fn append(&self, data: &Bytes, _timestamp_offset: f64) -> Result<(), SinkError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(SinkError::Busy);
        }
        self.appends.lock().unwrap().push(data.clone());
        Ok(())
    }

    fn remove(&self, _start: f64, _end: f64) -> Result<(), SinkError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(SinkError::Busy);
        }
        Ok(())
    }

    fn abort(&self) {
        self.busy.store(false, Ordering::SeqCst);
    }

    fn busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_manifest_to_sink_appends() {
    let master_url = Url::parse("https://cdn.example.com/hls/master.m3u8").unwrap();
    assert_eq!(
        ManifestFormat::detect(None, &master_url),
        Some(ManifestFormat::Hls)
    );

    let fetcher = Arc::new(CdnFetcher {
        fetched: Mutex::new(Vec::new()),
    });

    // Master playlist in, one lazily-indexed rendition out.
    let period = parse_playlist(MASTER, &master_url, fetcher.clone()).unwrap();
    let media = period.default_media().unwrap();
    assert_eq!(media.segment_count(), 0);
    assert_eq!(media.refresh().await.unwrap(), 3);
    assert!(media.is_ended());
    assert_eq!(media.seekable_ranges().window_duration(), 6.0);

    // Buffer the whole rendition.
    let mut consumer = StreamConsumer::new(Arc::clone(&media), fetcher.clone());
    let issued = consumer
        .set_fetch_target_range(TimeInterval::new(0.0, 6.0).unwrap())
        .unwrap();
    assert_eq!(issued, 3);
    consumer.drain_inflight().await;

    let buffered = consumer.buffered_ranges();
    assert_eq!(buffered.len(), 1);
    assert_eq!(buffered.cumulated_duration(), 6.0);

    // Every buffered payload goes through the append queue in segment
    // order, one sink operation at a time.
    let sink = Arc::new(SingleWriterSink::default());
    let mut queue = SinkAppendQueue::new(Arc::clone(&sink) as Arc<dyn MediaSink>, "video/mp2t");
    for segment in media.segments() {
        let payload = segment.buffer().expect("segment fetched");
        queue.append(payload, segment.locator().start_time);
    }
    while queue.is_busy() || queue.queued_ops() > 0 {
        sink.complete();
        queue.on_update_end();
    }

    let appends = sink.appends.lock().unwrap().clone();
    assert_eq!(appends.len(), 3);
    for (i, payload) in appends.iter().enumerate() {
        assert_eq!(payload, &Bytes::from(format!("payload:/hls/low/seg-{i}.ts")));
    }

    // The clock events of a successful start walk the machine to Playing.
    let mut machine = PlaybackStateMachine::new(None);
    let mut reasons = ReasonQueue::new();
    machine
        .trigger_state_transition(Some(
            rivulet::playback::TransitionReason::EngineInit,
        ))
        .unwrap();
    reasons.enqueue_event(MediaClockEvent::LoadedMetadata);
    reasons.enqueue_event(MediaClockEvent::DurationChange);
    reasons.enqueue_event(MediaClockEvent::Play { autoplay: true });
    reasons.enqueue_event(MediaClockEvent::TimeUpdate);
    reasons.drain(&mut machine).unwrap();
    assert_eq!(machine.state(), PlaybackState::Playing);
}
