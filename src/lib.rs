//! Timeline aggregation for camera events and recordings.
//!
//! [`TimelineAggregator`] keeps a renderable item collection in step with an
//! expensive remote [`MediaProvider`], using coverage trackers to skip
//! windows it has already fetched.

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod coverage;
pub mod identity;
pub mod models;
pub mod provider;
pub mod quantize;
pub mod segmentation;
pub mod sorter;
pub mod store;
pub mod utils;

pub use aggregator::{LegOutcome, RefreshOutcome, TimelineAggregator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TimelineConfig;
pub use coverage::{ExpiringRangeCoverageTracker, RangeCoverageTracker};
pub use identity::{CameraScopedIdentity, ItemIdentity};
pub use models::{CameraConfig, ItemKind, MediaRecord, Segment, TimeRange, TimelineItem};
pub use provider::{EventFilters, MediaProvider, MemoryProvider};
pub use quantize::{cap_end_date, QuantizeOptions, WindowQuantizer};
pub use segmentation::compress;
pub use sorter::sort_records;
pub use store::{ItemStore, ItemView, StoreChange};
pub use utils::init_logging;
