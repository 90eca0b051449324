use chrono::{DateTime, FixedOffset, Offset, TimeDelta, Utc};

use crate::models::TimeRange;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuantizeOptions {
    /// Cap the snapped end so it never runs past the minute containing "now".
    /// The minute ceiling is deliberate: now = 14:25:00 caps to 14:25:59.999,
    /// not 14:25:00. Coverage is still recorded only up to "now" itself.
    pub end_cap: bool,
}

/// Snaps requested windows to clock-hour or clock-day buckets so that small
/// pans and zooms keep hitting the same cached fetch.
///
/// Bucket edges are computed in a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct WindowQuantizer {
    offset: FixedOffset,
}

impl Default for WindowQuantizer {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl WindowQuantizer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// A window inside one clock hour becomes `HH:00:00.000..=HH:59:59.999`;
    /// anything wider becomes whole clock days. With `end_cap` the end is
    /// pulled back to the last millisecond of the current minute when that is
    /// earlier, but never before the snapped start.
    pub fn quantize(
        &self,
        range: &TimeRange,
        options: QuantizeOptions,
        now: DateTime<Utc>,
    ) -> TimeRange {
        let same_hour = self.floor(range.start, HOUR_MS) == self.floor(range.end, HOUR_MS);

        let (start, end) = if same_hour {
            (self.floor(range.start, HOUR_MS), self.ceil(range.start, HOUR_MS))
        } else {
            (self.floor(range.start, DAY_MS), self.ceil(range.end, DAY_MS))
        };

        let end = if options.end_cap {
            end.min(self.ceil(now, MINUTE_MS)).max(start)
        } else {
            end
        };

        TimeRange::new(start, end)
    }

    /// Start of the bucket of width `unit_ms` containing `at`.
    fn floor(&self, at: DateTime<Utc>, unit_ms: i64) -> DateTime<Utc> {
        let offset_ms = self.offset.local_minus_utc() as i64 * 1000;
        let local_ms = at.timestamp_millis() + offset_ms;
        let sub_ms = (at.timestamp_subsec_nanos() % 1_000_000) as i64;
        at - TimeDelta::milliseconds(local_ms.rem_euclid(unit_ms)) - TimeDelta::nanoseconds(sub_ms)
    }

    /// Last millisecond of the bucket of width `unit_ms` containing `at`.
    fn ceil(&self, at: DateTime<Utc>, unit_ms: i64) -> DateTime<Utc> {
        self.floor(at, unit_ms) + TimeDelta::milliseconds(unit_ms - 1)
    }
}

/// Returns `min(date, now)`.
pub fn cap_end_date(date: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    date.min(now)
}
