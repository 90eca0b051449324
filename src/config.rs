use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::models::CameraConfig;
use crate::provider::EventFilters;

/// Upper bound for any tolerance, one week.
const MAX_TOLERANCE_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineConfig {
    pub cameras: Vec<CameraConfig>,
    /// How long fetched event coverage stays valid.
    pub event_freshness_secs: u64,
    /// Recordings newer than `now - recording_freshness_secs` are always refetched.
    pub recording_freshness_secs: u64,
    /// Gap between recording segments still drawn as one block.
    pub recording_tolerance_secs: u64,
    pub utc_offset_secs: i32,
    pub event_filters: EventFilters,
    pub log_level: String,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            cameras: Vec::new(),
            event_freshness_secs: 30,
            recording_freshness_secs: 60,
            recording_tolerance_secs: 60,
            utc_offset_secs: 0,
            event_filters: EventFilters::default(),
            log_level: "info".into(),
        }
    }
}

impl TimelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents).context("malformed config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for camera in &self.cameras {
            if camera.id.trim().is_empty() {
                bail!("camera id must not be empty");
            }
            if !seen.insert(camera.id.as_str()) {
                bail!("duplicate camera id '{}'", camera.id);
            }
        }

        for (name, value) in [
            ("eventFreshnessSecs", self.event_freshness_secs),
            ("recordingFreshnessSecs", self.recording_freshness_secs),
            ("recordingToleranceSecs", self.recording_tolerance_secs),
        ] {
            if value > MAX_TOLERANCE_SECS {
                bail!("{name} = {value} exceeds {MAX_TOLERANCE_SECS}");
            }
        }

        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_secs)
            .ok_or_else(|| anyhow!("utcOffsetSecs {} out of range", self.utc_offset_secs))
    }

    pub fn event_freshness(&self) -> TimeDelta {
        seconds(self.event_freshness_secs)
    }

    pub fn recording_freshness(&self) -> TimeDelta {
        seconds(self.recording_freshness_secs)
    }
}

fn seconds(value: u64) -> TimeDelta {
    TimeDelta::seconds(value.min(MAX_TOLERANCE_SECS) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = TimelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.event_freshness_secs, 30);
        assert_eq!(config.recording_tolerance_secs, 60);
        assert_eq!(config.log_level, "info");
        assert!(config.cameras.is_empty());
    }

    #[test]
    fn parses_cameras_and_filters() {
        let config = TimelineConfig::from_json_str(
            r#"{
                "cameras": [
                    {"id": "front", "title": "Front door"},
                    {"id": "garage", "recordingsEnabled": false}
                ],
                "eventFreshnessSecs": 45,
                "utcOffsetSecs": 3600,
                "eventFilters": {"labels": ["person"], "limit": 50}
            }"#,
        )
        .unwrap();

        assert_eq!(config.cameras.len(), 2);
        assert!(config.cameras[0].recordings_enabled);
        assert!(!config.cameras[1].recordings_enabled);
        assert!(config.cameras[1].events_enabled);
        assert_eq!(config.event_freshness(), TimeDelta::seconds(45));
        assert_eq!(config.utc_offset().unwrap().local_minus_utc(), 3600);
        assert_eq!(config.event_filters.limit, Some(50));
    }

    #[test]
    fn rejects_duplicate_cameras() {
        let err = TimelineConfig::from_json_str(r#"{"cameras": [{"id": "a"}, {"id": "a"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate camera id"));
    }

    #[test]
    fn rejects_negative_tolerance_and_bad_offset() {
        assert!(TimelineConfig::from_json_str(r#"{"recordingToleranceSecs": -5}"#).is_err());
        assert!(TimelineConfig::from_json_str(r#"{"utcOffsetSecs": 90000}"#).is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TimelineConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
