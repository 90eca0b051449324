pub mod expiring;
pub mod merge;
pub mod range_set;

pub use expiring::{is_expired, CoverageEntry, ExpiringRangeCoverageTracker};
pub use range_set::RangeCoverageTracker;
