//! MPEG-DASH MPD parsing.
//!
//! The MPD walk covers `Period → AdaptationSet → Representation →
//! {BaseURL, SegmentBase{indexRange, Initialization{range}}}`. A
//! representation carrying both a base URL and an index byte-range gets a
//! lazy provider that fetches the byte-ranged `sidx` box, decodes it, and
//! converts its references 1:1 into byte-ranged media segments.

use std::str::FromStr;
use std::sync::Arc;

use quick_xml::events::Event;
use quick_xml::Reader;
use rivulet_core::{ByteRange, NetworkFetcher};
use rivulet_isobmff::{find_boxes, FourCc, SidxBox};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::Error;
use crate::model::{
    AdaptiveMedia, AdaptiveMediaPeriod, AdaptiveMediaSet, MediaInfo, MediaLocator, MediaSegment,
    MediaType, SegmentIndex, SegmentIndexProvider, VideoInfo,
};

/// Parsed MPD document structure, before model construction.
#[derive(Debug, Default, PartialEq)]
pub struct MpdDocument {
    pub periods: Vec<MpdPeriod>,
}

#[derive(Debug, Default, PartialEq)]
pub struct MpdPeriod {
    pub adaptation_sets: Vec<MpdAdaptationSet>,
}

#[derive(Debug, Default, PartialEq)]
pub struct MpdAdaptationSet {
    pub content_type: Option<String>,
    pub mime_type: Option<String>,
    pub representations: Vec<MpdRepresentation>,
}

#[derive(Debug, Default, PartialEq)]
pub struct MpdRepresentation {
    pub id: Option<String>,
    pub bandwidth: Option<u64>,
    pub codecs: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub base_url: Option<String>,
    pub index_range: Option<ByteRange>,
    pub init_range: Option<ByteRange>,
}

/// Parse MPD XML into its document structure.
pub fn parse_mpd(xml: &str) -> Result<MpdDocument, Error> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    let mut buf = Vec::new();

    let mut document = MpdDocument::default();
    let mut saw_root = false;
    let mut current_period: Option<MpdPeriod> = None;
    let mut current_set: Option<MpdAdaptationSet> = None;
    let mut current_rep: Option<MpdRepresentation> = None;
    let mut in_base_url = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| Error::InvalidMpd(e.to_string()))?
        {
            Event::Start(ref e) | Event::Empty(ref e) => {
                match e.name().as_ref() {
                    b"MPD" => saw_root = true,
                    b"Period" => current_period = Some(MpdPeriod::default()),
                    b"AdaptationSet" => {
                        let mut set = MpdAdaptationSet::default();
                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| Error::InvalidMpd(e.to_string()))?;
                            let value = attr
                                .unescape_value()
                                .map_err(|e| Error::InvalidMpd(e.to_string()))?;
                            match attr.key.as_ref() {
                                b"contentType" => set.content_type = Some(value.to_string()),
                                b"mimeType" => set.mime_type = Some(value.to_string()),
                                _ => {}
                            }
                        }
                        current_set = Some(set);
                    }
                    b"Representation" => {
                        let mut rep = MpdRepresentation::default();
                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| Error::InvalidMpd(e.to_string()))?;
                            let value = attr
                                .unescape_value()
                                .map_err(|e| Error::InvalidMpd(e.to_string()))?;
                            match attr.key.as_ref() {
                                b"id" => rep.id = Some(value.to_string()),
                                b"bandwidth" => rep.bandwidth = value.parse().ok(),
                                b"codecs" => rep.codecs = Some(value.to_string()),
                                b"width" => rep.width = value.parse().ok(),
                                b"height" => rep.height = value.parse().ok(),
                                _ => {}
                            }
                        }
                        current_rep = Some(rep);
                    }
                    b"BaseURL" => in_base_url = true,
                    b"SegmentBase" => {
                        if let Some(rep) = current_rep.as_mut() {
                            for attr in e.attributes() {
                                let attr = attr.map_err(|e| Error::InvalidMpd(e.to_string()))?;
                                if attr.key.as_ref() == b"indexRange" {
                                    let value = attr
                                        .unescape_value()
                                        .map_err(|e| Error::InvalidMpd(e.to_string()))?;
                                    rep.index_range = Some(
                                        ByteRange::from_str(&value)
                                            .map_err(|e| Error::InvalidMpd(e.to_string()))?,
                                    );
                                }
                            }
                        }
                    }
                    b"Initialization" => {
                        if let Some(rep) = current_rep.as_mut() {
                            for attr in e.attributes() {
                                let attr = attr.map_err(|e| Error::InvalidMpd(e.to_string()))?;
                                if attr.key.as_ref() == b"range" {
                                    let value = attr
                                        .unescape_value()
                                        .map_err(|e| Error::InvalidMpd(e.to_string()))?;
                                    rep.init_range = Some(
                                        ByteRange::from_str(&value)
                                            .map_err(|e| Error::InvalidMpd(e.to_string()))?,
                                    );
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref t) => {
                if in_base_url {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::InvalidMpd(e.to_string()))?;
                    if let Some(rep) = current_rep.as_mut() {
                        rep.base_url = Some(text.trim().to_string());
                    }
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"BaseURL" => in_base_url = false,
                b"Representation" => {
                    if let (Some(set), Some(rep)) = (current_set.as_mut(), current_rep.take()) {
                        set.representations.push(rep);
                    }
                }
                b"AdaptationSet" => {
                    if let (Some(period), Some(set)) =
                        (current_period.as_mut(), current_set.take())
                    {
                        period.adaptation_sets.push(set);
                    }
                }
                b"Period" => {
                    if let Some(period) = current_period.take() {
                        document.periods.push(period);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(Error::MissingMpdRoot);
    }
    Ok(document)
}

/// Parse an MPD and build its periods in the shared rendition model.
pub fn parse_mpd_manifest(
    xml: &str,
    url: &Url,
    fetcher: Arc<dyn NetworkFetcher>,
) -> Result<Vec<Arc<AdaptiveMediaPeriod>>, Error> {
    let document = parse_mpd(xml)?;
    let mut periods = Vec::with_capacity(document.periods.len());
    for mpd_period in &document.periods {
        let period = Arc::new(AdaptiveMediaPeriod::new());
        for mpd_set in &mpd_period.adaptation_sets {
            let set = Arc::new(AdaptiveMediaSet::new());
            let type_source = mpd_set
                .content_type
                .as_deref()
                .or(mpd_set.mime_type.as_deref());
            if let Some(media_type) = type_source.and_then(MediaType::from_content_type) {
                set.insert_media_type(media_type);
            }
            for rep in &mpd_set.representations {
                let video = match (rep.width, rep.height) {
                    (Some(width), Some(height)) => Some(VideoInfo { width, height }),
                    _ => None,
                };
                let media = Arc::new(AdaptiveMedia::new(MediaInfo {
                    bandwidth: rep.bandwidth,
                    codecs: rep.codecs.clone(),
                    video,
                    label: rep.id.clone(),
                }));
                match (&rep.base_url, rep.index_range) {
                    (Some(base), Some(index_range)) => {
                        let media_url = url.join(base)?;
                        media.set_segment_index_provider(segment_index_provider(
                            Arc::clone(&fetcher),
                            media_url,
                            index_range,
                            rep.init_range,
                        ));
                    }
                    _ => {
                        debug!(
                            id = rep.id.as_deref().unwrap_or("?"),
                            "representation has no base URL or index range, no segments"
                        );
                    }
                }
                set.add_media(&media)?;
            }
            period.add_set(&set)?;
        }
        periods.push(period);
    }
    Ok(periods)
}

/// Provider that fetches the representation's byte-ranged `sidx` and
/// converts its references into concrete media segments.
fn segment_index_provider(
    fetcher: Arc<dyn NetworkFetcher>,
    url: Url,
    index_range: ByteRange,
    init_range: Option<ByteRange>,
) -> SegmentIndexProvider {
    Arc::new(move || {
        let fetcher = Arc::clone(&fetcher);
        let url = url.clone();
        Box::pin(async move {
            let mut segments = Vec::new();
            // Reference byte offsets come out relative to the buffer the
            // sidx was decoded from; pair the box with that buffer's first
            // absolute byte so ranges can be rebased onto the resource.
            let mut sidx: Option<(SidxBox, u64)> = None;

            if let Some(init_range) = init_range {
                let init = fetcher.issue(&url, Some(&init_range)).await?;
                let has_moov = !find_boxes(&init.data, &[FourCc::MOOV])?.is_empty();
                trace!(uri = %url, has_moov, "fetched initialization segment");
                sidx = SidxBox::from_buffer(&init.data)?.map(|s| (s, init_range.from));
                segments.push(Arc::new(MediaSegment::new(MediaLocator::untimed(
                    url.clone(),
                    Some(init_range),
                ))));
            }

            let index = fetcher.issue(&url, Some(&index_range)).await?;
            if let Some(decoded) = SidxBox::from_buffer(&index.data)? {
                sidx = Some((decoded, index_range.from));
            }

            let Some((sidx, base_offset)) = sidx else {
                warn!(uri = %url, "no segment index found, representation yields no segments");
                return Ok(SegmentIndex {
                    segments: Vec::new(),
                    ended: true,
                });
            };

            let mut running = sidx.earliest_presentation_time as f64 / sidx.timescale as f64;
            for reference in &sidx.references {
                let start_time = running;
                let end_time = running + reference.duration;
                running = end_time;
                let byte_range = ByteRange::new(
                    base_offset + reference.byte_start,
                    base_offset + reference.byte_end,
                );
                segments.push(Arc::new(MediaSegment::new(MediaLocator::new(
                    url.clone(),
                    start_time,
                    end_time,
                    Some(byte_range),
                ))));
            }
            Ok(SegmentIndex {
                segments,
                ended: true,
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use rivulet_core::{FetchError, FetchResponse};

    const MPD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static">
  <Period>
    <AdaptationSet contentType="video" mimeType="video/mp4">
      <Representation id="v0" bandwidth="1200000" codecs="avc1.42c01e" width="854" height="480">
        <BaseURL>video/stream.mp4</BaseURL>
        <SegmentBase indexRange="740-1019">
          <Initialization range="0-739"/>
        </SegmentBase>
      </Representation>
    </AdaptationSet>
    <AdaptationSet contentType="audio" mimeType="audio/mp4">
      <Representation id="a0" bandwidth="128000" codecs="mp4a.40.2">
        <BaseURL>audio/stream.mp4</BaseURL>
        <SegmentBase indexRange="612-891">
          <Initialization range="0-611"/>
        </SegmentBase>
      </Representation>
    </AdaptationSet>
  </Period>
</MPD>
"#;

    fn make_sidx(timescale: u32, first_offset: u32, refs: &[(u32, u32)]) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[0, 0, 0, 0]);
        payload.extend_from_slice(&1u32.to_be_bytes());
        payload.extend_from_slice(&timescale.to_be_bytes());
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.extend_from_slice(&first_offset.to_be_bytes());
        payload.extend_from_slice(&[0, 0]);
        payload.extend_from_slice(&(refs.len() as u16).to_be_bytes());
        for (size, duration) in refs {
            payload.extend_from_slice(&size.to_be_bytes());
            payload.extend_from_slice(&duration.to_be_bytes());
            payload.extend_from_slice(&[0, 0, 0, 0]);
        }
        let mut out = Vec::new();
        out.extend_from_slice(&((payload.len() as u32 + 8).to_be_bytes()));
        out.extend_from_slice(b"sidx");
        out.extend(payload);
        out
    }

    struct IndexFetcher {
        sidx: Vec<u8>,
    }

    #[async_trait]
    impl NetworkFetcher for IndexFetcher {
        async fn issue(
            &self,
            _url: &Url,
            byte_range: Option<&ByteRange>,
        ) -> Result<FetchResponse, FetchError> {
            // The init window gets opaque bytes, the index window the sidx.
            match byte_range {
                Some(range) if range.from > 0 => {
                    Ok(FetchResponse::from_data(Bytes::from(self.sidx.clone())))
                }
                _ => Ok(FetchResponse::from_data(Bytes::from_static(&[0u8; 16]))),
            }
        }
    }

    fn mpd_url() -> Url {
        Url::parse("https://cdn.example.com/dash/manifest.mpd").unwrap()
    }

    #[test]
    fn test_parse_mpd_document_structure() {
        let document = parse_mpd(MPD).unwrap();
        assert_eq!(document.periods.len(), 1);
        let sets = &document.periods[0].adaptation_sets;
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].content_type.as_deref(), Some("video"));

        let video = &sets[0].representations[0];
        assert_eq!(video.id.as_deref(), Some("v0"));
        assert_eq!(video.bandwidth, Some(1_200_000));
        assert_eq!(video.width, Some(854));
        assert_eq!(video.base_url.as_deref(), Some("video/stream.mp4"));
        assert_eq!(video.index_range, Some(ByteRange::new(740, 1019)));
        assert_eq!(video.init_range, Some(ByteRange::new(0, 739)));
    }

    #[test]
    fn test_missing_root_is_rejected() {
        assert!(matches!(
            parse_mpd("<notmpd></notmpd>"),
            Err(Error::MissingMpdRoot)
        ));
    }

    #[test]
    fn test_build_periods_tags_content_types() {
        let fetcher = Arc::new(IndexFetcher {
            sidx: make_sidx(1000, 0, &[(100, 2000)]),
        });
        let periods = parse_mpd_manifest(MPD, &mpd_url(), fetcher).unwrap();
        assert_eq!(periods.len(), 1);

        let sets = periods[0].sets();
        assert_eq!(sets.len(), 2);
        assert!(sets[0].media_types().video);
        assert!(sets[1].media_types().audio);
        assert!(sets[0].media()[0].has_segment_index_provider());
    }

    #[tokio::test]
    async fn test_refresh_converts_sidx_references_to_segments() {
        let sidx = make_sidx(1000, 0, &[(100, 2000), (50, 2000)]);
        let sidx_len = sidx.len() as u64;
        let fetcher = Arc::new(IndexFetcher { sidx });

        let periods = parse_mpd_manifest(MPD, &mpd_url(), fetcher).unwrap();
        let media = periods[0].default_media().unwrap();
        media.refresh().await.unwrap();

        let segments = media.segments();
        // One untimed init segment plus one segment per reference.
        assert_eq!(segments.len(), 3);
        assert!(!segments[0].locator().is_timed());
        assert_eq!(
            segments[0].locator().byte_range,
            Some(ByteRange::new(0, 739))
        );

        let first = segments[1].locator();
        assert_eq!(first.start_time, 0.0);
        assert_eq!(first.end_time, 2.0);
        assert_eq!(
            first.byte_range,
            Some(ByteRange::new(740 + sidx_len, 740 + sidx_len + 99))
        );
        assert_eq!(
            first.uri.as_str(),
            "https://cdn.example.com/dash/video/stream.mp4"
        );

        // References stay byte-contiguous after rebasing.
        let second = segments[2].locator().byte_range.unwrap();
        assert_eq!(second.from, first.byte_range.unwrap().to + 1);
        assert_eq!(segments[2].locator().end_time, 4.0);
        assert!(media.is_ended());
    }
}
