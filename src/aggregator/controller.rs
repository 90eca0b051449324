use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    clock::{Clock, SystemClock},
    config::TimelineConfig,
    coverage::{ExpiringRangeCoverageTracker, RangeCoverageTracker},
    identity::{CameraScopedIdentity, ItemIdentity},
    models::{CameraConfig, ItemKind, MediaRecord, Segment, TimeRange, TimelineItem},
    provider::{EventFilters, MediaProvider},
    quantize::{cap_end_date, QuantizeOptions, WindowQuantizer},
    segmentation::{compress, segment_to_item},
    sorter::sort_records,
    store::{ItemStore, ItemView},
};

use super::{LegOutcome, RefreshOutcome};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Quantized windows end on `.999`, so neighbouring buckets are one
/// millisecond apart and must still count as touching.
fn bucket_adjacency() -> TimeDelta {
    TimeDelta::milliseconds(1)
}

/// The part of `window` old enough to be answered from coverage. A window
/// entirely inside the freshness horizon collapses to its start instant.
fn coverage_query(window: &TimeRange, now: DateTime<Utc>, freshness: TimeDelta) -> TimeRange {
    let horizon = now - freshness;
    TimeRange::new(window.start, window.end.min(horizon).max(window.start))
}

/// The part of a fetched window that had already happened when the fetch ran.
/// The quantized window may reach past `now`; data for that tail can still
/// arrive, so it is never recorded as covered.
fn settled_extent(fetch_window: &TimeRange, now: DateTime<Utc>) -> Option<TimeRange> {
    if fetch_window.start > now {
        return None;
    }
    Some(TimeRange::new(
        fetch_window.start,
        cap_end_date(fetch_window.end, now),
    ))
}

enum Leg<T> {
    Settled(LegOutcome),
    Pending(T),
}

/// Keeps a live timeline item collection in sync with a remote source while
/// avoiding refetching windows it has already proven complete.
///
/// `refresh` takes `&mut self`, so overlapping refreshes on one aggregator
/// are ruled out by the borrow checker rather than a lock.
pub struct TimelineAggregator<P, I = CameraScopedIdentity, C = SystemClock> {
    provider: P,
    identity: I,
    clock: C,
    cameras: Vec<CameraConfig>,
    event_filters: EventFilters,
    event_freshness: TimeDelta,
    recording_freshness: TimeDelta,
    recording_tolerance_secs: u64,
    quantizer: WindowQuantizer,
    event_coverage: ExpiringRangeCoverageTracker,
    recording_coverage: RangeCoverageTracker,
    store: ItemStore,
}

impl<P: MediaProvider> TimelineAggregator<P> {
    pub fn with_defaults(config: &TimelineConfig, provider: P) -> Result<Self> {
        Self::new(config, provider, CameraScopedIdentity, SystemClock)
    }
}

impl<P, I, C> TimelineAggregator<P, I, C>
where
    P: MediaProvider,
    I: ItemIdentity,
    C: Clock,
{
    pub fn new(config: &TimelineConfig, provider: P, identity: I, clock: C) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            provider,
            identity,
            clock,
            cameras: config.cameras.clone(),
            event_filters: config.event_filters.clone(),
            event_freshness: config.event_freshness(),
            recording_freshness: config.recording_freshness(),
            recording_tolerance_secs: config.recording_tolerance_secs,
            quantizer: WindowQuantizer::new(config.utc_offset()?),
            event_coverage: ExpiringRangeCoverageTracker::with_adjacency(bucket_adjacency()),
            recording_coverage: RangeCoverageTracker::with_adjacency(bucket_adjacency()),
            store: ItemStore::new(),
        })
    }

    /// Read-only handle for renderers.
    pub fn view(&self) -> ItemView {
        self.store.view()
    }

    pub fn cameras(&self) -> &[CameraConfig] {
        &self.cameras
    }

    pub fn event_coverage(&self) -> &ExpiringRangeCoverageTracker {
        &self.event_coverage
    }

    pub fn recording_coverage(&self) -> &RangeCoverageTracker {
        &self.recording_coverage
    }

    /// Run one aggregation cycle for the visible `window`.
    ///
    /// Never fails: a leg whose fetch errors is logged, reported in the
    /// outcome and left without coverage so the next refresh retries it.
    pub async fn refresh(&mut self, window: TimeRange) -> RefreshOutcome {
        // One sample of "now" for probing, quantizing, capping and expiry.
        let now = self.clock.now();
        let fetch_window = self
            .quantizer
            .quantize(&window, QuantizeOptions { end_cap: true }, now);

        let events_leg = self.plan_events(&window, now);
        let recordings_leg = self.plan_recordings(&window, now);

        let (events_result, recordings_result) = {
            let provider = &self.provider;
            let filters = &self.event_filters;

            let events = async {
                match events_leg {
                    Leg::Settled(outcome) => Leg::Settled(outcome),
                    Leg::Pending(cameras) => Leg::Pending(
                        provider
                            .query_events(&cameras, &fetch_window, filters)
                            .await,
                    ),
                }
            };
            let recordings = async {
                match recordings_leg {
                    Leg::Settled(outcome) => Leg::Settled(outcome),
                    Leg::Pending(cameras) => Leg::Pending(
                        provider
                            .query_recording_segments(&cameras, &fetch_window)
                            .await,
                    ),
                }
            };

            tokio::join!(events, recordings)
        };

        let settled = settled_extent(&fetch_window, now);

        let events = match events_result {
            Leg::Settled(outcome) => outcome,
            Leg::Pending(Ok(records)) => {
                let count = records.len();
                self.ingest_events(records);
                if let Some(extent) = settled {
                    self.event_coverage
                        .add(extent, now + self.event_freshness, now);
                }
                LegOutcome::Fetched { count }
            }
            Leg::Pending(Err(err)) => {
                log_error!(
                    "events fetch for {} .. {} failed: {err:#}",
                    fetch_window.start,
                    fetch_window.end
                );
                LegOutcome::Failed {
                    error: format!("{err:#}"),
                }
            }
        };

        let recordings = match recordings_result {
            Leg::Settled(outcome) => outcome,
            Leg::Pending(Ok(segments)) => {
                let count = self.ingest_recordings(segments);
                if let Some(extent) = settled {
                    self.recording_coverage.add(extent);
                }
                LegOutcome::Fetched { count }
            }
            Leg::Pending(Err(err)) => {
                log_error!(
                    "recordings fetch for {} .. {} failed: {err:#}",
                    fetch_window.start,
                    fetch_window.end
                );
                LegOutcome::Failed {
                    error: format!("{err:#}"),
                }
            }
        };

        RefreshOutcome {
            window: fetch_window,
            events,
            recordings,
        }
    }

    /// Drop every event item and all event coverage. Recordings are kept.
    pub fn clear_events(&mut self) {
        let change = self.store.remove_where(|item| !item.is_background());
        self.event_coverage.clear();
        log_info!("Cleared {} event items", change.removed.len());
    }

    /// Drop all items and forget all coverage.
    pub fn clear(&mut self) {
        let change = self.store.clear();
        self.event_coverage.clear();
        self.recording_coverage.clear();
        log_info!("Cleared timeline ({} items)", change.removed.len());
    }

    /// Re-derive the item for a single record and swap it in with a fresh
    /// identity. Returns `false` if the record cannot be turned into an item.
    pub fn rewrite_event(&mut self, record: &MediaRecord) -> bool {
        match self.event_item(record) {
            Some(item) => {
                self.store.force_replace([item]);
                true
            }
            None => false,
        }
    }

    fn plan_events(&mut self, window: &TimeRange, now: DateTime<Utc>) -> Leg<Vec<String>> {
        let cameras = self.camera_ids(|camera| camera.events_enabled);
        if cameras.is_empty() {
            return Leg::Settled(LegOutcome::Skipped);
        }

        let query = coverage_query(window, now, self.event_freshness);
        if self.event_coverage.has_coverage(&query, now) {
            log_debug!("events already covered for {} .. {}", query.start, query.end);
            return Leg::Settled(LegOutcome::Covered);
        }
        Leg::Pending(cameras)
    }

    fn plan_recordings(&self, window: &TimeRange, now: DateTime<Utc>) -> Leg<Vec<String>> {
        let cameras = self.camera_ids(|camera| camera.recordings_enabled);
        if cameras.is_empty() {
            return Leg::Settled(LegOutcome::Skipped);
        }

        let query = coverage_query(window, now, self.recording_freshness);
        if self.recording_coverage.has_coverage(&query) {
            log_debug!("recordings already covered for {} .. {}", query.start, query.end);
            return Leg::Settled(LegOutcome::Covered);
        }
        Leg::Pending(cameras)
    }

    fn camera_ids(&self, include: impl Fn(&CameraConfig) -> bool) -> Vec<String> {
        self.cameras
            .iter()
            .filter(|camera| include(camera))
            .map(|camera| camera.id.clone())
            .collect()
    }

    fn camera(&self, id: &str) -> Option<&CameraConfig> {
        self.cameras.iter().find(|camera| camera.id == id)
    }

    fn event_item(&self, record: &MediaRecord) -> Option<TimelineItem> {
        let camera = self.camera(&record.camera_id)?;
        let start = record.start_time?;
        let id = self.identity.event_item_id(camera, record)?;
        let end = record
            .end_time
            .map(|end| end.max(start).timestamp_millis());

        Some(TimelineItem {
            id,
            group: camera.id.clone(),
            start: start.timestamp_millis(),
            end,
            kind: if end.is_some() {
                ItemKind::Range
            } else {
                ItemKind::Point
            },
            payload: Some(record.clone()),
        })
    }

    fn ingest_events(&self, records: Vec<MediaRecord>) {
        let received = records.len();
        let mut items = Vec::with_capacity(received);
        let mut dropped = 0usize;

        for record in sort_records(&records) {
            match self.event_item(&record) {
                Some(item) => items.push(item),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            log_warn!("Skipped {dropped} event records lacking a known camera, start time or id");
        }

        let change = self.store.upsert(items);
        log_info!(
            "Ingested {} events ({} added, {} updated)",
            received,
            change.added.len(),
            change.updated.len()
        );
    }

    /// Fold segments into each camera's background blocks. Returns the
    /// number of segments received.
    fn ingest_recordings(&self, by_camera: HashMap<String, Vec<Segment>>) -> usize {
        let mut received = 0;

        for (camera_id, segments) in by_camera {
            let Some(camera) = self.camera(&camera_id) else {
                log_debug!("Ignoring {} segments for unknown camera {camera_id}", segments.len());
                continue;
            };
            received += segments.len();
            if segments.is_empty() {
                continue;
            }

            let fresh: Vec<TimelineItem> = segments
                .iter()
                .filter(|segment| segment.start_time <= segment.end_time)
                .filter_map(|segment| {
                    segment_to_item(
                        &camera.id,
                        segment,
                        self.identity.recording_item_id(camera, segment),
                    )
                })
                .collect();

            let dropped = segments.len() - fresh.len();
            if dropped > 0 {
                log_warn!(
                    "Skipped {dropped} segments for camera {} with inverted or out-of-range times",
                    camera.id
                );
            }

            let belongs = |item: &TimelineItem| item.is_background() && item.group == camera.id;
            let existing = self.store.get(belongs);
            let blocks = compress(existing.into_iter().chain(fresh), self.recording_tolerance_secs);
            let block_count = blocks.len();
            self.store.replace_where(belongs, blocks);

            log_debug!(
                "Camera {} now has {} recording blocks after {} new segments",
                camera.id,
                block_count,
                segments.len()
            );
        }

        received
    }
}
