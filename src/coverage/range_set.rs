use chrono::TimeDelta;

use crate::models::TimeRange;

use super::merge::coalesce_sorted;

/// Disjoint, ascending set of intervals known to be completely fetched.
///
/// Overlapping or touching intervals are merged eagerly on insert, so a
/// coverage query only ever has to consult a single stored interval.
#[derive(Debug, Clone, Default)]
pub struct RangeCoverageTracker {
    ranges: Vec<TimeRange>,
    adjacency: TimeDelta,
}

impl RangeCoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat intervals separated by at most `slack` as touching.
    pub fn with_adjacency(slack: TimeDelta) -> Self {
        Self {
            ranges: Vec::new(),
            adjacency: slack,
        }
    }

    pub fn add(&mut self, range: TimeRange) {
        let mut ranges = std::mem::take(&mut self.ranges);
        ranges.push(range);
        ranges.sort_by_key(|r| (r.start, r.end));

        let slack = self.adjacency;
        self.ranges = coalesce_sorted(ranges, |current, next| {
            if next.start <= current.end + slack {
                current.end = current.end.max(next.end);
                true
            } else {
                false
            }
        });
    }

    pub fn has_coverage(&self, range: &TimeRange) -> bool {
        // Last stored interval starting at or before the query start is the
        // only candidate that can contain it.
        let idx = self.ranges.partition_point(|r| r.start <= range.start);
        idx > 0 && self.ranges[idx - 1].contains(range)
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
