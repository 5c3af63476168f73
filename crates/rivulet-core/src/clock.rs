//! Playback clock capability.

/// A point-in-time view of the embedder's playback clock.
///
/// Snapshots are plain data: the core never holds a live reference to the
/// clock, it only interprets snapshots handed to it (state inference) or
/// pulled on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSnapshot {
    /// Current playback position in seconds.
    pub current_time: f64,
    /// Media duration in seconds. `NAN` while unknown.
    pub duration: f64,
    /// Readiness level, `0` (nothing) through `4` (enough data).
    pub ready_state: u8,
    /// Whether playback is paused.
    pub paused: bool,
    /// Whether playback reached the end of the media.
    pub ended: bool,
    /// Whether the clock is in a fatal error state.
    pub errored: bool,
    /// Whether a media source is attached.
    pub has_source: bool,
}

impl ClockSnapshot {
    /// A detached clock: no source, nothing loaded.
    pub fn detached() -> Self {
        Self {
            current_time: 0.0,
            duration: f64::NAN,
            ready_state: 0,
            paused: true,
            ended: false,
            errored: false,
            has_source: false,
        }
    }
}

/// Capability to observe the playback clock.
pub trait MediaClockSource: Send + Sync {
    /// Take a consistent snapshot of the clock's current state.
    fn snapshot(&self) -> ClockSnapshot;
}
