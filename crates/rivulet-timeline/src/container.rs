use crate::interval::TimeInterval;

/// An ordered collection of time intervals.
///
/// Intervals accumulate in insertion order and may overlap freely until
/// [`flatten`](Self::flatten) normalizes the collection into disjoint,
/// non-touching intervals sorted by start. Flattening is idempotent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeIntervalContainer {
    ranges: Vec<TimeInterval>,
}

impl TimeIntervalContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ranges(ranges: Vec<TimeInterval>) -> Self {
        Self { ranges }
    }

    /// Append an interval without normalizing.
    pub fn add(&mut self, range: TimeInterval) {
        self.ranges.push(range);
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeInterval> {
        self.ranges.iter()
    }

    pub fn ranges(&self) -> &[TimeInterval] {
        &self.ranges
    }

    /// Clear every interval.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Normalize into disjoint, non-touching intervals sorted by start.
    ///
    /// Overlapping or touching neighbors merge into their union. Returns a
    /// new container; the receiver is untouched.
    pub fn flatten(&self) -> TimeIntervalContainer {
        if self.ranges.len() < 2 {
            return self.clone();
        }
        let mut sorted = self.ranges.clone();
        sorted.sort_by(|a, b| a.start().total_cmp(&b.start()));

        let mut merged: Vec<TimeInterval> = Vec::with_capacity(sorted.len());
        for range in sorted {
            match merged.last_mut() {
                Some(last) => match last.merged_range(&range) {
                    Some(union) => *last = union,
                    None => merged.push(range),
                },
                None => merged.push(range),
            }
        }
        TimeIntervalContainer { ranges: merged }
    }

    /// Whether any interval here overlaps any interval of `other`.
    pub fn has_overlapping_ranges_with(&self, other: &TimeIntervalContainer) -> bool {
        self.ranges
            .iter()
            .any(|a| other.ranges.iter().any(|b| a.overlaps_with(b)))
    }

    /// Whether `time` falls inside any interval.
    pub fn contains_time(&self, time: f64, strict: bool) -> bool {
        self.ranges.iter().any(|r| r.contains_time(time, strict))
    }

    /// Span from the earliest start to the latest end, ignoring gaps.
    ///
    /// Meaningful on a flattened container; zero when empty.
    pub fn window_duration(&self) -> f64 {
        match (self.ranges.first(), self.ranges.last()) {
            (Some(first), Some(last)) => last.end() - first.start(),
            _ => 0.0,
        }
    }

    /// Sum of the individual interval durations.
    pub fn cumulated_duration(&self) -> f64 {
        self.ranges.iter().map(|r| r.duration()).sum()
    }
}

impl<'a> IntoIterator for &'a TimeIntervalContainer {
    type Item = &'a TimeInterval;
    type IntoIter = std::slice::Iter<'a, TimeInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}
