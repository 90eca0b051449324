use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{MediaRecord, Segment, TimeRange};

/// Filters forwarded to the remote events query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventFilters {
    pub labels: Option<Vec<String>>,
    pub zones: Option<Vec<String>>,
    pub has_clip: Option<bool>,
    pub has_snapshot: Option<bool>,
    pub limit: Option<usize>,
}

impl EventFilters {
    pub fn matches(&self, record: &MediaRecord) -> bool {
        if let Some(labels) = &self.labels {
            match &record.label {
                Some(label) if labels.contains(label) => {}
                _ => return false,
            }
        }
        if let Some(zones) = &self.zones {
            if !record.zones.iter().any(|zone| zones.contains(zone)) {
                return false;
            }
        }
        if self.has_clip.is_some_and(|wanted| wanted != record.has_clip) {
            return false;
        }
        if self
            .has_snapshot
            .is_some_and(|wanted| wanted != record.has_snapshot)
        {
            return false;
        }
        true
    }
}

/// The remote source of events and recordings. Queries are expensive and
/// may fail; timeouts and retries are the implementor's business.
#[allow(async_fn_in_trait)]
pub trait MediaProvider {
    async fn query_events(
        &self,
        camera_ids: &[String],
        window: &TimeRange,
        filters: &EventFilters,
    ) -> Result<Vec<MediaRecord>>;

    async fn query_recording_segments(
        &self,
        camera_ids: &[String],
        window: &TimeRange,
    ) -> Result<HashMap<String, Vec<Segment>>>;
}

impl<P: MediaProvider> MediaProvider for &P {
    async fn query_events(
        &self,
        camera_ids: &[String],
        window: &TimeRange,
        filters: &EventFilters,
    ) -> Result<Vec<MediaRecord>> {
        (**self).query_events(camera_ids, window, filters).await
    }

    async fn query_recording_segments(
        &self,
        camera_ids: &[String],
        window: &TimeRange,
    ) -> Result<HashMap<String, Vec<Segment>>> {
        (**self).query_recording_segments(camera_ids, window).await
    }
}

/// Provider answering from an in-memory fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemoryProvider {
    pub events: Vec<MediaRecord>,
    pub recordings: HashMap<String, Vec<Segment>>,
}

impl MemoryProvider {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))
    }
}

fn overlaps_ms(start_ms: i64, end_ms: i64, window: &TimeRange) -> bool {
    start_ms <= window.end_ms() && end_ms >= window.start_ms()
}

// Segments whose seconds overflow milliseconds cannot lie in any window.
fn segment_overlaps(segment: &Segment, window: &TimeRange) -> bool {
    match (
        segment.start_time.checked_mul(1000),
        segment.end_time.checked_mul(1000),
    ) {
        (Some(start_ms), Some(end_ms)) => overlaps_ms(start_ms, end_ms, window),
        _ => false,
    }
}

impl MediaProvider for MemoryProvider {
    async fn query_events(
        &self,
        camera_ids: &[String],
        window: &TimeRange,
        filters: &EventFilters,
    ) -> Result<Vec<MediaRecord>> {
        let matching = self
            .events
            .iter()
            .filter(|record| camera_ids.contains(&record.camera_id))
            .filter(|record| match record.start_time {
                Some(start) => {
                    let end = record.end_time.unwrap_or(start);
                    overlaps_ms(start.timestamp_millis(), end.timestamp_millis(), window)
                }
                // Passed through untouched; the caller decides what to do with them.
                None => true,
            })
            .filter(|record| filters.matches(record))
            .take(filters.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }

    async fn query_recording_segments(
        &self,
        camera_ids: &[String],
        window: &TimeRange,
    ) -> Result<HashMap<String, Vec<Segment>>> {
        let mut result = HashMap::new();
        for camera_id in camera_ids {
            let Some(segments) = self.recordings.get(camera_id) else {
                continue;
            };
            let hits: Vec<Segment> = segments
                .iter()
                .filter(|segment| segment_overlaps(segment, window))
                .cloned()
                .collect();
            result.insert(camera_id.clone(), hits);
        }
        Ok(result)
    }
}
