use serde::{Deserialize, Serialize};

use super::MediaRecord;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Point,
    Range,
    /// Continuous recording presence.
    Background,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Point => "point",
            ItemKind::Range => "range",
            ItemKind::Background => "background",
        }
    }
}

/// A renderable unit on the timeline. Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineItem {
    pub id: String,
    /// Camera identifier the item is drawn under.
    pub group: String,
    pub start: i64,
    pub end: Option<i64>,
    pub kind: ItemKind,
    pub payload: Option<MediaRecord>,
}

impl TimelineItem {
    pub fn background(id: impl Into<String>, group: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            start,
            end: Some(end),
            kind: ItemKind::Background,
            payload: None,
        }
    }

    /// End used for ordering and merging; point items end where they start.
    pub fn end_or_start(&self) -> i64 {
        self.end.unwrap_or(self.start)
    }

    pub fn is_background(&self) -> bool {
        self.kind == ItemKind::Background
    }
}
