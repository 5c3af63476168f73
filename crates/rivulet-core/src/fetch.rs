//! Network fetch capability.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::byte_range::ByteRange;

/// Terminal failure of a fetch.
///
/// An aborted fetch is a distinct outcome, not a transport error: callers
/// use [`FetchError::is_aborted`] to keep cancellation bookkeeping separate
/// from retry decisions. The core itself never retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP status {status} fetching {uri}")]
    Http { uri: String, status: u16 },

    /// The transport failed before a response completed.
    #[error("transport error fetching {uri}: {message}")]
    Transport { uri: String, message: String },

    /// The fetch was canceled before completion.
    #[error("fetch aborted: {uri}")]
    Aborted { uri: String },
}

impl FetchError {
    /// Whether this failure was a cancellation rather than an error.
    pub fn is_aborted(&self) -> bool {
        matches!(self, FetchError::Aborted { .. })
    }
}

/// A completed fetch: the payload plus the response metadata the core
/// consumes (total size for open-ended byte ranges, advertised mime type).
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The fetched bytes. Immutable once received.
    pub data: Bytes,
    /// `Content-Length`/`Content-Range` total, when the transport knows it.
    pub total_size: Option<u64>,
    /// Advertised content type, when present.
    pub content_type: Option<String>,
}

impl FetchResponse {
    /// Wrap a plain payload with no response metadata.
    pub fn from_data(data: Bytes) -> Self {
        Self {
            data,
            total_size: None,
            content_type: None,
        }
    }
}

/// Capability to fetch a resource, optionally bounded to a byte window.
///
/// Implementations must surface success and failure through the returned
/// `Result` and treat dropping the returned future as an abort; the core
/// cancels fetches by dropping, and accounts for them via
/// [`FetchError::Aborted`] when the transport reports the abort itself.
/// Progress reporting is an embedder concern; the core only consumes
/// terminal outcomes.
#[async_trait]
pub trait NetworkFetcher: Send + Sync {
    /// Fetch `url`, bounded to `byte_range` when given.
    async fn issue(
        &self,
        url: &Url,
        byte_range: Option<&ByteRange>,
    ) -> Result<FetchResponse, FetchError>;
}
