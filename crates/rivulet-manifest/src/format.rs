//! Manifest format detection.

use url::Url;

/// The two manifest dialects the parsers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Hls,
    Dash,
}

impl ManifestFormat {
    /// Detect the format from a response content type and/or the manifest
    /// URL's extension. Content type wins when both are present.
    pub fn detect(content_type: Option<&str>, url: &Url) -> Option<ManifestFormat> {
        if let Some(content_type) = content_type {
            let content_type = content_type.to_ascii_lowercase();
            if content_type.contains("mpegurl") {
                return Some(ManifestFormat::Hls);
            }
            if content_type.contains("dash+xml") {
                return Some(ManifestFormat::Dash);
            }
        }
        let path = url.path().to_ascii_lowercase();
        if path.ends_with(".m3u8") || path.ends_with(".m3u") {
            Some(ManifestFormat::Hls)
        } else if path.ends_with(".mpd") {
            Some(ManifestFormat::Dash)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_prefers_content_type() {
        let url = Url::parse("https://cdn.example.com/stream.mpd").unwrap();
        assert_eq!(
            ManifestFormat::detect(Some("application/vnd.apple.mpegurl"), &url),
            Some(ManifestFormat::Hls)
        );
        assert_eq!(
            ManifestFormat::detect(None, &url),
            Some(ManifestFormat::Dash)
        );
    }

    #[test]
    fn test_detection_by_extension() {
        let m3u8 = Url::parse("https://cdn.example.com/live/index.m3u8?token=x").unwrap();
        assert_eq!(
            ManifestFormat::detect(None, &m3u8),
            Some(ManifestFormat::Hls)
        );
        let opaque = Url::parse("https://cdn.example.com/stream").unwrap();
        assert_eq!(ManifestFormat::detect(None, &opaque), None);
    }
}
