//! Rivulet-Playback: a deterministic playback state machine
//!
//! Playback state only ever moves along a fixed transition table, keyed by
//! normalized [`TransitionReason`] values. Media-clock events are first
//! translated into reasons ([`events`]), queued, and drained one at a time,
//! so the machine is never re-entered from one of its own notifications.

pub mod error;
pub mod events;
pub mod machine;

pub use error::TransitionError;
pub use events::{MediaClockEvent, ReasonQueue};
pub use machine::{PlaybackState, PlaybackStateMachine, StateTransition, TransitionReason};
