use std::fmt;

use crate::error::Error;

/// A closed time window `[start, end]` in seconds.
///
/// Construction enforces `start <= end` with finite bounds; every interval
/// in circulation is well-formed, so the set operations below never have to
/// re-validate their inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeInterval {
    start: f64,
    end: f64,
}

impl TimeInterval {
    /// Create an interval, rejecting inverted or non-finite bounds.
    pub fn new(start: f64, end: f64) -> Result<Self, Error> {
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(Error::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Bounds already validated by the caller.
    pub(crate) fn new_unchecked(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the window in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether both bounds coincide with `other`'s.
    pub fn equals(&self, other: &TimeInterval) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// Whether `other` lies entirely within this interval.
    pub fn contains(&self, other: &TimeInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether `time` falls inside the window.
    ///
    /// With `strict`, the bounds themselves do not count.
    pub fn contains_time(&self, time: f64, strict: bool) -> bool {
        if strict {
            self.start < time && time < self.end
        } else {
            self.start <= time && time <= self.end
        }
    }

    /// Whether the two windows share more than a boundary point.
    pub fn overlaps_with(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the two windows share exactly a boundary point.
    pub fn touches_with(&self, other: &TimeInterval) -> bool {
        self.end == other.start || other.end == self.start
    }

    /// Whether this window begins exactly where `other` ends.
    pub fn continues(&self, other: &TimeInterval) -> bool {
        self.start == other.end
    }

    /// The shared sub-window, when the two windows overlap.
    pub fn overlapping_range(&self, other: &TimeInterval) -> Option<TimeInterval> {
        if !self.overlaps_with(other) {
            return None;
        }
        Some(TimeInterval::new_unchecked(
            self.start.max(other.start),
            self.end.min(other.end),
        ))
    }

    /// The union window, when the two windows overlap or touch.
    pub fn merged_range(&self, other: &TimeInterval) -> Option<TimeInterval> {
        if !self.overlaps_with(other) && !self.touches_with(other) {
            return None;
        }
        Some(TimeInterval::new_unchecked(
            self.start.min(other.start),
            self.end.max(other.end),
        ))
    }

    /// The window separating two disjoint, non-touching windows.
    pub fn gap_range(&self, other: &TimeInterval) -> Option<TimeInterval> {
        if self.overlaps_with(other) || self.touches_with(other) {
            return None;
        }
        if self.end < other.start {
            Some(TimeInterval::new_unchecked(self.end, other.start))
        } else {
            Some(TimeInterval::new_unchecked(other.end, self.start))
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
