//! Media-clock event translation and the reason dispatch queue.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::TransitionError;
use crate::machine::{PlaybackStateMachine, TransitionReason};

/// Lifecycle and clock events a media clock source emits, normalized away
/// from any concrete platform event names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaClockEvent {
    ReadyStateChange(u8),
    LoadedMetadata,
    LoadedData,
    Play { autoplay: bool },
    Playing,
    Pause,
    TimeUpdate,
    DurationChange,
    Seeking,
    Seeked,
    Waiting,
    Stalled,
    Ended,
    Error,
}

/// Map a clock event to the transition reasons it implies, in order.
///
/// Some events carry no state-machine meaning and map to nothing.
pub fn translate_event(event: MediaClockEvent) -> Vec<TransitionReason> {
    match event {
        MediaClockEvent::ReadyStateChange(0) => vec![TransitionReason::BufferUnderrun],
        MediaClockEvent::ReadyStateChange(_) => vec![TransitionReason::LoadingProgress],
        MediaClockEvent::LoadedMetadata => vec![TransitionReason::LoadingProgress],
        MediaClockEvent::LoadedData => vec![TransitionReason::LoadingProgress],
        MediaClockEvent::Play { autoplay: true } => vec![TransitionReason::Autoplay],
        MediaClockEvent::Play { autoplay: false } => vec![TransitionReason::ManualPlay],
        MediaClockEvent::Playing => vec![TransitionReason::ClockUpdate],
        MediaClockEvent::Pause => vec![TransitionReason::Pause],
        MediaClockEvent::TimeUpdate => vec![TransitionReason::ClockUpdate],
        MediaClockEvent::DurationChange => vec![TransitionReason::DurationChange],
        MediaClockEvent::Seeking => vec![TransitionReason::Seek],
        MediaClockEvent::Seeked => Vec::new(),
        MediaClockEvent::Waiting => vec![TransitionReason::BufferUnderrun],
        MediaClockEvent::Stalled => Vec::new(),
        MediaClockEvent::Ended => vec![TransitionReason::End],
        MediaClockEvent::Error => vec![TransitionReason::Error],
    }
}

const QUEUE_CAPACITY: usize = 64;

/// A bounded queue decoupling event arrival from transition application.
///
/// The clock source may emit events from inside a transition notification;
/// enqueueing is always safe, and `drain` refuses to re-enter itself, so
/// the state machine is applied one reason at a time.
#[derive(Debug, Default)]
pub struct ReasonQueue {
    reasons: VecDeque<TransitionReason>,
    draining: bool,
}

impl ReasonQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }

    /// Queue one reason. Returns `false` when the queue is full and the
    /// reason was discarded.
    pub fn enqueue(&mut self, reason: TransitionReason) -> bool {
        if self.reasons.len() >= QUEUE_CAPACITY {
            warn!(?reason, "reason queue full, discarding");
            return false;
        }
        self.reasons.push_back(reason);
        true
    }

    /// Translate an event and queue every reason it implies.
    pub fn enqueue_event(&mut self, event: MediaClockEvent) {
        for reason in translate_event(event) {
            self.enqueue(reason);
        }
    }

    /// Apply queued reasons to the machine, one at a time.
    ///
    /// A reason the current state has no row for is expected during
    /// ordinary playback (e.g. a time update while paused mid-seek) and is
    /// skipped; ambiguity is a real fault and is returned. Re-entrant
    /// calls return immediately.
    pub fn drain(
        &mut self,
        machine: &mut PlaybackStateMachine,
    ) -> Result<(), TransitionError> {
        if self.draining {
            return Ok(());
        }
        self.draining = true;
        let result = self.drain_inner(machine);
        self.draining = false;
        result
    }

    fn drain_inner(
        &mut self,
        machine: &mut PlaybackStateMachine,
    ) -> Result<(), TransitionError> {
        while let Some(reason) = self.reasons.pop_front() {
            match machine.trigger_state_transition(Some(reason)) {
                Ok(_) => {}
                Err(TransitionError::NoLegalTransition { state, .. }) => {
                    debug!(?reason, ?state, "reason has no transition here, skipped");
                }
                Err(failure) => return Err(failure),
            }
        }
        Ok(())
    }
}
