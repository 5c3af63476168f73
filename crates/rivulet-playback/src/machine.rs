use rivulet_core::ClockSnapshot;
use tracing::{debug, error};

use crate::error::TransitionError;

/// The playback lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    Null,
    Ready,
    MetadataLoading,
    Paused,
    Playing,
    Ended,
    Error,
}

/// Normalized causes a transition can be requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionReason {
    EngineInit,
    LoadingProgress,
    ClockUpdate,
    DurationChange,
    Autoplay,
    ManualPlay,
    Pause,
    BufferUnderrun,
    Seek,
    End,
    Error,
    Recover,
}

/// The sole source of legal moves. For any (state, reason) pair at most
/// one row exists; states with several unconditional rows cannot be left
/// without naming a reason.
const TRANSITIONS: &[(PlaybackState, PlaybackState, TransitionReason)] = &[
    (PlaybackState::Null, PlaybackState::Ready, TransitionReason::EngineInit),
    (PlaybackState::Ready, PlaybackState::MetadataLoading, TransitionReason::BufferUnderrun),
    (PlaybackState::Ready, PlaybackState::MetadataLoading, TransitionReason::LoadingProgress),
    (PlaybackState::MetadataLoading, PlaybackState::Paused, TransitionReason::DurationChange),
    (PlaybackState::MetadataLoading, PlaybackState::Error, TransitionReason::Error),
    (PlaybackState::Paused, PlaybackState::Paused, TransitionReason::EngineInit),
    (PlaybackState::Paused, PlaybackState::Paused, TransitionReason::Autoplay),
    (PlaybackState::Paused, PlaybackState::Paused, TransitionReason::ManualPlay),
    (PlaybackState::Paused, PlaybackState::Paused, TransitionReason::Seek),
    (PlaybackState::Paused, PlaybackState::Paused, TransitionReason::BufferUnderrun),
    (PlaybackState::Paused, PlaybackState::Paused, TransitionReason::LoadingProgress),
    (PlaybackState::Paused, PlaybackState::Playing, TransitionReason::ClockUpdate),
    (PlaybackState::Playing, PlaybackState::Playing, TransitionReason::ClockUpdate),
    (PlaybackState::Playing, PlaybackState::Paused, TransitionReason::Pause),
    (PlaybackState::Playing, PlaybackState::Paused, TransitionReason::BufferUnderrun),
    (PlaybackState::Playing, PlaybackState::Paused, TransitionReason::Seek),
    (PlaybackState::Playing, PlaybackState::Paused, TransitionReason::Error),
    (PlaybackState::Playing, PlaybackState::Ended, TransitionReason::End),
    (PlaybackState::Ended, PlaybackState::Paused, TransitionReason::Seek),
    (PlaybackState::Ended, PlaybackState::Paused, TransitionReason::ManualPlay),
    (PlaybackState::Paused, PlaybackState::Error, TransitionReason::Error),
    (PlaybackState::Error, PlaybackState::Paused, TransitionReason::Recover),
];

/// One applied transition, as delivered to the transition callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: PlaybackState,
    pub to: PlaybackState,
    pub reason: Option<TransitionReason>,
}

type TransitionCallback = Box<dyn Fn(&StateTransition) + Send>;
type FailureCallback = Box<dyn Fn(&TransitionError) + Send>;

/// A table-driven resolver over [`PlaybackState`].
///
/// Transitions are resolved synchronously; callers must not re-enter
/// `trigger_state_transition` from inside the transition callback. Clock
/// events go through [`ReasonQueue`](crate::events::ReasonQueue) for that
/// reason.
pub struct PlaybackStateMachine {
    state: PlaybackState,
    previous_state: Option<PlaybackState>,
    on_transition: Option<TransitionCallback>,
    on_failure: Option<FailureCallback>,
}

impl PlaybackStateMachine {
    /// Start from an explicit state, or `Null`.
    pub fn new(initial: Option<PlaybackState>) -> Self {
        Self {
            state: initial.unwrap_or(PlaybackState::Null),
            previous_state: None,
            on_transition: None,
            on_failure: None,
        }
    }

    /// Start from the state a clock snapshot implies.
    pub fn from_snapshot(snapshot: &ClockSnapshot) -> Self {
        Self::new(Some(Self::state_for_snapshot(snapshot)))
    }

    /// Infer a playback state from a clock snapshot.
    pub fn state_for_snapshot(snapshot: &ClockSnapshot) -> PlaybackState {
        if snapshot.errored {
            PlaybackState::Error
        } else if snapshot.ended {
            PlaybackState::Ended
        } else if snapshot.ready_state == 0 {
            if snapshot.has_source {
                PlaybackState::Ready
            } else {
                PlaybackState::Null
            }
        } else if snapshot.paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn previous_state(&self) -> Option<PlaybackState> {
        self.previous_state
    }

    /// Register the transition notification callback.
    pub fn on_transition(&mut self, callback: impl Fn(&StateTransition) + Send + 'static) {
        self.on_transition = Some(Box::new(callback));
    }

    /// Register the failure notification callback.
    ///
    /// This channel only carries internal inconsistency (an ambiguous
    /// table resolution), which means the session must be torn down, not
    /// retried. Ordinary refused transitions surface solely through the
    /// returned `Err`.
    pub fn on_failure(&mut self, callback: impl Fn(&TransitionError) + Send + 'static) {
        self.on_failure = Some(Box::new(callback));
    }

    /// States reachable from the current state in one transition.
    pub fn next_possible_states(&self) -> Vec<PlaybackState> {
        let mut states = Vec::new();
        for (from, to, _) in TRANSITIONS {
            if *from == self.state && !states.contains(to) {
                states.push(*to);
            }
        }
        states
    }

    /// States that can reach the current state in one transition.
    pub fn previous_possible_states(&self) -> Vec<PlaybackState> {
        let mut states = Vec::new();
        for (from, to, _) in TRANSITIONS {
            if *to == self.state && !states.contains(from) {
                states.push(*from);
            }
        }
        states
    }

    /// Resolve and apply a transition.
    ///
    /// The table filtered by the current state (and by `reason` when
    /// given) must yield exactly one row: zero rows is a "no legal
    /// transition" failure, several rows an "ambiguous transition"
    /// failure. A reasonless call is therefore only legal from states
    /// with a single unconditional outgoing edge.
    pub fn trigger_state_transition(
        &mut self,
        reason: Option<TransitionReason>,
    ) -> Result<StateTransition, TransitionError> {
        let candidates: Vec<_> = TRANSITIONS
            .iter()
            .filter(|(from, _, row_reason)| {
                *from == self.state && reason.map_or(true, |r| r == *row_reason)
            })
            .collect();

        let (_, to, _) = match candidates.as_slice() {
            [single] => **single,
            [] => {
                // A reason with no row here is an ordinary refusal, not an
                // internal inconsistency: the caller decides whether to
                // skip it. The failure channel stays quiet.
                debug!(state = ?self.state, ?reason, "no legal transition");
                return Err(TransitionError::NoLegalTransition {
                    state: self.state,
                    reason,
                });
            }
            many => {
                let failure = TransitionError::AmbiguousTransition {
                    state: self.state,
                    reason,
                    candidates: many.len(),
                };
                self.notify_failure(&failure);
                return Err(failure);
            }
        };

        let transition = StateTransition {
            from: self.state,
            to,
            reason,
        };
        self.previous_state = Some(self.state);
        self.state = to;
        debug!(from = ?transition.from, to = ?transition.to, reason = ?reason, "playback transition");
        if let Some(callback) = &self.on_transition {
            callback(&transition);
        }
        Ok(transition)
    }

    fn notify_failure(&self, failure: &TransitionError) {
        error!(%failure, "playback transition failure");
        if let Some(callback) = &self.on_failure {
            callback(failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_engine_init_is_the_unique_exit_from_null() {
        let mut machine = PlaybackStateMachine::new(None);
        assert_eq!(machine.state(), PlaybackState::Null);

        let transition = machine
            .trigger_state_transition(Some(TransitionReason::EngineInit))
            .unwrap();
        assert_eq!(transition.to, PlaybackState::Ready);
        assert_eq!(machine.state(), PlaybackState::Ready);
        assert_eq!(machine.previous_state(), Some(PlaybackState::Null));
    }

    #[test]
    fn test_reasonless_call_from_null_succeeds() {
        // Null has exactly one unconditional outgoing edge.
        let mut machine = PlaybackStateMachine::new(None);
        let transition = machine.trigger_state_transition(None).unwrap();
        assert_eq!(transition.to, PlaybackState::Ready);
    }

    #[test]
    fn test_reasonless_call_from_paused_is_ambiguous() {
        let mut machine = PlaybackStateMachine::new(Some(PlaybackState::Paused));
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&failures);
        machine.on_failure(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let result = machine.trigger_state_transition(None);
        assert!(matches!(
            result,
            Err(TransitionError::AmbiguousTransition { .. })
        ));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        // The state is unchanged on failure.
        assert_eq!(machine.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_illegal_reason_is_rejected() {
        let mut machine = PlaybackStateMachine::new(None);
        assert!(matches!(
            machine.trigger_state_transition(Some(TransitionReason::Pause)),
            Err(TransitionError::NoLegalTransition { .. })
        ));
    }

    #[test]
    fn test_full_playback_walk() {
        let mut machine = PlaybackStateMachine::new(None);
        let steps = [
            (TransitionReason::EngineInit, PlaybackState::Ready),
            (TransitionReason::LoadingProgress, PlaybackState::MetadataLoading),
            (TransitionReason::DurationChange, PlaybackState::Paused),
            (TransitionReason::Autoplay, PlaybackState::Paused),
            (TransitionReason::ClockUpdate, PlaybackState::Playing),
            (TransitionReason::End, PlaybackState::Ended),
            (TransitionReason::Seek, PlaybackState::Paused),
        ];
        for (reason, expected) in steps {
            let transition = machine.trigger_state_transition(Some(reason)).unwrap();
            assert_eq!(transition.to, expected);
        }
    }

    #[test]
    fn test_error_state_recovers_to_paused() {
        let mut machine = PlaybackStateMachine::new(Some(PlaybackState::Paused));
        machine
            .trigger_state_transition(Some(TransitionReason::Error))
            .unwrap();
        assert_eq!(machine.state(), PlaybackState::Error);
        machine
            .trigger_state_transition(Some(TransitionReason::Recover))
            .unwrap();
        assert_eq!(machine.state(), PlaybackState::Paused);
    }

    #[test]
    fn test_transition_callback_carries_the_reason() {
        let mut machine = PlaybackStateMachine::new(None);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        machine.on_transition(move |t| {
            assert_eq!(t.reason, Some(TransitionReason::EngineInit));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        machine
            .trigger_state_transition(Some(TransitionReason::EngineInit))
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_possible_state_queries() {
        let machine = PlaybackStateMachine::new(Some(PlaybackState::Playing));
        let next = machine.next_possible_states();
        assert!(next.contains(&PlaybackState::Playing));
        assert!(next.contains(&PlaybackState::Paused));
        assert!(next.contains(&PlaybackState::Ended));
        assert_eq!(next.len(), 3);

        let previous = machine.previous_possible_states();
        assert_eq!(previous, vec![PlaybackState::Paused, PlaybackState::Playing]);
    }

    #[test]
    fn test_snapshot_inference() {
        let mut snapshot = ClockSnapshot::detached();
        assert_eq!(
            PlaybackStateMachine::state_for_snapshot(&snapshot),
            PlaybackState::Null
        );
        snapshot.has_source = true;
        assert_eq!(
            PlaybackStateMachine::state_for_snapshot(&snapshot),
            PlaybackState::Ready
        );
        snapshot.ready_state = 2;
        assert_eq!(
            PlaybackStateMachine::state_for_snapshot(&snapshot),
            PlaybackState::Paused
        );
        snapshot.paused = false;
        assert_eq!(
            PlaybackStateMachine::state_for_snapshot(&snapshot),
            PlaybackState::Playing
        );
        snapshot.ended = true;
        assert_eq!(
            PlaybackStateMachine::state_for_snapshot(&snapshot),
            PlaybackState::Ended
        );
        snapshot.errored = true;
        assert_eq!(
            PlaybackStateMachine::state_for_snapshot(&snapshot),
            PlaybackState::Error
        );
    }
}
