use thiserror::Error;

/// Errors from manifest parsing and the rendition model.
#[derive(Debug, Error)]
pub enum Error {
    /// An M3U8 playlist failed to parse.
    #[error("invalid playlist: {0}")]
    InvalidPlaylist(String),

    /// A playlist is neither a master nor a media playlist.
    #[error("playlist is neither a master nor a media playlist")]
    UnknownPlaylistType,

    /// Manifest bytes are not valid UTF-8.
    #[error("manifest is not valid UTF-8")]
    InvalidUtf8,

    /// An MPD document failed to parse.
    #[error("invalid MPD: {0}")]
    InvalidMpd(String),

    /// The XML document carries no `MPD` root element.
    #[error("missing MPD root element")]
    MissingMpdRoot,

    /// A manifest URI failed to resolve.
    #[error("invalid URI")]
    InvalidUri(#[from] url::ParseError),

    /// A binary segment index failed to decode.
    #[error("segment index error")]
    Index(#[from] rivulet_isobmff::Error),

    /// A fetch issued during parsing or refresh failed.
    #[error("fetch failed")]
    Fetch(#[from] rivulet_core::FetchError),

    /// `refresh` was called on a rendition with no segment-index provider.
    #[error("no segment index provider attached")]
    NoSegmentIndexProvider,

    /// A media or set already belongs to a parent.
    #[error("already attached to a parent")]
    AlreadyParented,
}
