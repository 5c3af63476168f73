use thiserror::Error;

use crate::machine::{PlaybackState, TransitionReason};

/// A transition request the table cannot satisfy deterministically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// No table row leaves `state` for the given reason.
    #[error("no legal transition from {state:?} with reason {reason:?}")]
    NoLegalTransition {
        state: PlaybackState,
        reason: Option<TransitionReason>,
    },

    /// More than one table row matched; the request was underspecified.
    #[error("ambiguous transition from {state:?} with reason {reason:?} ({candidates} candidates)")]
    AmbiguousTransition {
        state: PlaybackState,
        reason: Option<TransitionReason>,
        candidates: usize,
    },
}
