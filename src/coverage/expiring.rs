use chrono::{DateTime, TimeDelta, Utc};

use crate::models::TimeRange;

use super::merge::coalesce_sorted;

/// A covered interval that stops counting once `expires_at` is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageEntry {
    pub range: TimeRange,
    pub expires_at: DateTime<Utc>,
}

/// The single freshness comparison used by every read and write path.
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at <= now
}

/// Coverage set whose entries age out.
///
/// Expiry is lazy: stale entries are pruned on every `add` and `has_coverage`
/// call, using the `now` the caller passes in. There is no background sweep.
#[derive(Debug, Clone, Default)]
pub struct ExpiringRangeCoverageTracker {
    entries: Vec<CoverageEntry>,
    adjacency: TimeDelta,
}

impl ExpiringRangeCoverageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adjacency(slack: TimeDelta) -> Self {
        Self {
            entries: Vec::new(),
            adjacency: slack,
        }
    }

    /// Record `range` as covered until `expires_at`. Merged entries keep the
    /// later of the two expiries.
    pub fn add(&mut self, range: TimeRange, expires_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.prune(now);
        if is_expired(expires_at, now) {
            return;
        }

        let mut entries = std::mem::take(&mut self.entries);
        entries.push(CoverageEntry { range, expires_at });
        entries.sort_by_key(|e| (e.range.start, e.range.end));

        let slack = self.adjacency;
        self.entries = coalesce_sorted(entries, |current, next| {
            if next.range.start <= current.range.end + slack {
                current.range.end = current.range.end.max(next.range.end);
                current.expires_at = current.expires_at.max(next.expires_at);
                true
            } else {
                false
            }
        });
    }

    pub fn has_coverage(&mut self, range: &TimeRange, now: DateTime<Utc>) -> bool {
        self.prune(now);
        let idx = self
            .entries
            .partition_point(|e| e.range.start <= range.start);
        idx > 0 && self.entries[idx - 1].range.contains(range)
    }

    /// Drop stale entries, returning how many were removed.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !is_expired(e.expires_at, now));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries as last pruned; may include ones that have since gone stale.
    pub fn entries(&self) -> &[CoverageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
