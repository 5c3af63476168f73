//! HLS playlist parsing.
//!
//! Adapter around the `hls_m3u8` crate. A master playlist becomes one
//! rendition per variant, each with a lazy segment-index provider that
//! fetches and parses the variant's own media playlist on demand. A media
//! playlist becomes a single rendition whose provider refetches the same
//! playlist, which is what live refresh needs.

use std::sync::Arc;

use hls_m3u8::tags::VariantStream as HlsVariantStream;
use hls_m3u8::MasterPlaylist as HlsMasterPlaylist;
use hls_m3u8::MediaPlaylist as HlsMediaPlaylist;
use rivulet_core::NetworkFetcher;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::model::{
    AdaptiveMedia, AdaptiveMediaPeriod, AdaptiveMediaSet, MediaInfo, MediaLocator, MediaSegment,
    MediaType, SegmentIndex, SegmentIndexProvider, VideoInfo,
};

/// Playlist classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistKind {
    /// Lists variant sub-playlists.
    Master,
    /// Lists media segments.
    Media,
}

/// Classify playlist text by its tag vocabulary.
pub fn classify_playlist(text: &str) -> Result<PlaylistKind, Error> {
    if text.contains("#EXT-X-STREAM-INF") {
        Ok(PlaylistKind::Master)
    } else if text.contains("#EXTINF") {
        Ok(PlaylistKind::Media)
    } else {
        Err(Error::UnknownPlaylistType)
    }
}

/// Parse playlist text of either kind into a period.
pub fn parse_playlist(
    text: &str,
    url: &Url,
    fetcher: Arc<dyn NetworkFetcher>,
) -> Result<AdaptiveMediaPeriod, Error> {
    match classify_playlist(text)? {
        PlaylistKind::Master => parse_master_playlist(text, url, fetcher),
        PlaylistKind::Media => parse_media_playlist(text, url, fetcher),
    }
}

/// Parse a master playlist: one rendition per variant stream.
pub fn parse_master_playlist(
    text: &str,
    url: &Url,
    fetcher: Arc<dyn NetworkFetcher>,
) -> Result<AdaptiveMediaPeriod, Error> {
    let master = HlsMasterPlaylist::try_from(text)
        .map_err(|e| Error::InvalidPlaylist(e.to_string()))?
        .into_owned();

    let period = AdaptiveMediaPeriod::new();
    let set = Arc::new(AdaptiveMediaSet::new());

    for variant in master.variant_streams.iter() {
        // I-frame-only variants are trick-play streams, not renditions.
        let HlsVariantStream::ExtXStreamInf {
            uri, stream_data, ..
        } = variant
        else {
            continue;
        };
        let playlist_url = url.join(uri.as_ref())?;
        let codecs = stream_data.codecs().map(|c| c.to_string());
        let video = stream_data.resolution().map(|r| VideoInfo {
            width: r.width() as u32,
            height: r.height() as u32,
        });

        for media_type in media_types_for_variant(codecs.as_deref(), video.is_some()) {
            set.insert_media_type(media_type);
        }

        let media = Arc::new(AdaptiveMedia::new(MediaInfo {
            bandwidth: Some(stream_data.bandwidth()),
            codecs,
            video,
            label: Some(uri.to_string()),
        }));
        media.set_segment_index_provider(media_playlist_provider(
            Arc::clone(&fetcher),
            playlist_url,
        ));
        set.add_media(&media)?;
    }

    debug!(variants = set.media().len(), url = %url, "parsed master playlist");
    period.add_set(&set)?;
    Ok(period)
}

/// Parse a media playlist into a single-rendition period.
pub fn parse_media_playlist(
    text: &str,
    url: &Url,
    fetcher: Arc<dyn NetworkFetcher>,
) -> Result<AdaptiveMediaPeriod, Error> {
    let index = parse_media_segments(text, url)?;

    let media = Arc::new(AdaptiveMedia::new(MediaInfo::default()));
    media.set_ended(index.ended);
    media.push_segments(index.segments);
    media.set_segment_index_provider(media_playlist_provider(fetcher, url.clone()));

    let set = Arc::new(AdaptiveMediaSet::new());
    set.insert_media_type(MediaType::Video);
    set.insert_media_type(MediaType::Audio);
    set.add_media(&media)?;

    let period = AdaptiveMediaPeriod::new();
    period.add_set(&set)?;
    Ok(period)
}

/// Parse a media playlist's segment entries.
///
/// Start times accumulate from zero in declaration order; segment URIs
/// resolve against the playlist's own URL.
pub fn parse_media_segments(text: &str, url: &Url) -> Result<SegmentIndex, Error> {
    let playlist = HlsMediaPlaylist::try_from(text)
        .map_err(|e| Error::InvalidPlaylist(e.to_string()))?
        .into_owned();

    let mut running_total = 0.0f64;
    let mut segments = Vec::new();
    for (_, segment) in playlist.segments.iter() {
        let duration = segment.duration.duration().as_secs_f64();
        let start_time = running_total;
        let end_time = running_total + duration;
        running_total = end_time;

        let locator =
            MediaLocator::from_relative_uri(url, segment.uri().as_ref(), start_time, end_time, None)?;
        segments.push(Arc::new(MediaSegment::new(locator)));
    }

    Ok(SegmentIndex {
        segments,
        ended: text.contains("#EXT-X-ENDLIST"),
    })
}

fn media_playlist_provider(fetcher: Arc<dyn NetworkFetcher>, url: Url) -> SegmentIndexProvider {
    Arc::new(move || {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        Box::pin(async move {
            let response = fetcher.issue(&url, None).await?;
            let text = std::str::from_utf8(&response.data).map_err(|_| Error::InvalidUtf8)?;
            parse_media_segments(text, &url)
        })
    })
}

fn media_types_for_variant(codecs: Option<&str>, has_resolution: bool) -> Vec<MediaType> {
    let mut types = Vec::new();
    if let Some(codecs) = codecs {
        let codecs = codecs.to_ascii_lowercase();
        if ["avc", "hvc", "hev", "vp9", "vp09", "av01"]
            .iter()
            .any(|c| codecs.contains(c))
        {
            types.push(MediaType::Video);
        }
        if ["mp4a", "ac-3", "ec-3", "opus", "flac"]
            .iter()
            .any(|c| codecs.contains(c))
        {
            types.push(MediaType::Audio);
        }
        if ["wvtt", "stpp"].iter().any(|c| codecs.contains(c)) {
            types.push(MediaType::Text);
        }
    }
    if types.is_empty() && has_resolution {
        types.push(MediaType::Video);
    }
    if types.is_empty() {
        // Muxed transport streams carry both unless told otherwise.
        types.push(MediaType::Video);
        types.push(MediaType::Audio);
    }
    types
}
