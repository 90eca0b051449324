use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event as returned by the remote source.
///
/// Every field except `camera_id` may be missing on malformed records; such
/// records are dropped at ingestion rather than failing a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub camera_id: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub has_clip: bool,
    #[serde(default)]
    pub has_snapshot: bool,
}

impl MediaRecord {
    pub fn new(camera_id: impl Into<String>) -> Self {
        Self {
            id: None,
            camera_id: camera_id.into(),
            start_time: None,
            end_time: None,
            label: None,
            zones: Vec::new(),
            score: None,
            has_clip: false,
            has_snapshot: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_times(mut self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        self.start_time = Some(start);
        self.end_time = end;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A recording segment. Timestamps are epoch seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub start_time: i64,
    pub end_time: i64,
}

impl Segment {
    pub fn new(id: impl Into<String>, start_time: i64, end_time: i64) -> Self {
        Self {
            id: id.into(),
            start_time,
            end_time,
        }
    }
}
