use serde::Serialize;

use crate::models::TimeRange;

/// What happened to one fetch leg during a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum LegOutcome {
    /// Existing coverage already proves the window; nothing was fetched.
    Covered,
    /// No configured camera takes part in this leg.
    Skipped,
    /// Fetched and ingested; `count` is the number of records or segments received.
    Fetched { count: usize },
    /// The provider failed. Coverage was left untouched.
    Failed { error: String },
}

impl LegOutcome {
    pub fn fetched(&self) -> bool {
        matches!(self, LegOutcome::Fetched { .. })
    }

    pub fn failed(&self) -> bool {
        matches!(self, LegOutcome::Failed { .. })
    }

    pub fn hit_provider(&self) -> bool {
        self.fetched() || self.failed()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// Quantized window that was (or would have been) fetched.
    pub window: TimeRange,
    pub events: LegOutcome,
    pub recordings: LegOutcome,
}

impl RefreshOutcome {
    pub fn fetch_count(&self) -> usize {
        [&self.events, &self.recordings]
            .into_iter()
            .filter(|leg| leg.hit_provider())
            .count()
    }
}
