//! Byte-window value type shared by the fetcher contract and the media model.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error parsing a raw byte-range string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed byte-range string: {0:?}")]
pub struct ByteRangeParseError(pub String);

/// An inclusive HTTP byte window.
///
/// `total` is the size of the whole resource when known; `None` is the
/// "unknown" the wire formats leave unspecified (never conflated with zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte of the window (inclusive).
    pub from: u64,
    /// Last byte of the window (inclusive).
    pub to: u64,
    /// Total resource size, when advertised.
    pub total: Option<u64>,
}

impl ByteRange {
    /// Create a byte range with an unknown total size.
    pub fn new(from: u64, to: u64) -> Self {
        Self {
            from,
            to,
            total: None,
        }
    }

    /// Number of bytes covered by the window.
    pub fn len(&self) -> u64 {
        self.to.saturating_sub(self.from) + 1
    }

    /// A byte range always covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Render the window as an HTTP request `Range` header value.
    pub fn to_request_header(&self) -> String {
        format!("bytes={}-{}", self.from, self.to)
    }
}

impl FromStr for ByteRange {
    type Err = ByteRangeParseError;

    /// Parse the manifest form `"from-to"`, e.g. `"0-99"`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (from, to) = raw
            .split_once('-')
            .ok_or_else(|| ByteRangeParseError(raw.to_string()))?;
        let from = from
            .trim()
            .parse::<u64>()
            .map_err(|_| ByteRangeParseError(raw.to_string()))?;
        let to = to
            .trim()
            .parse::<u64>()
            .map_err(|_| ByteRangeParseError(raw.to_string()))?;
        if to < from {
            return Err(ByteRangeParseError(raw.to_string()));
        }
        Ok(Self::new(from, to))
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}
