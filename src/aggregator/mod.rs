pub mod controller;
pub mod outcome;

pub use controller::TimelineAggregator;
pub use outcome::{LegOutcome, RefreshOutcome};
