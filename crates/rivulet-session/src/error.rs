use thiserror::Error;

/// Errors from fetch scheduling.
#[derive(Debug, Error)]
pub enum Error {
    /// A segment in the scanned index carries a malformed time window.
    /// The whole scan pass is rejected rather than partially applied.
    #[error("segment has no valid duration: {uri}")]
    InvalidSegmentDuration { uri: String },

    /// A model operation failed during scheduling.
    #[error(transparent)]
    Manifest(#[from] rivulet_manifest::Error),
}
