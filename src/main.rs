use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use media_timeline::{init_logging, MemoryProvider, TimeRange, TimelineAggregator, TimelineConfig};
use serde::Serialize;

const USAGE: &str = "usage: timeline-replay <config.json> <fixture.json> <start-rfc3339> <end-rfc3339>";

#[derive(Serialize)]
struct Report<'a> {
    outcome: &'a media_timeline::RefreshOutcome,
    items: Vec<media_timeline::TimelineItem>,
}

fn parse_instant(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [config_path, fixture_path, start, end] = args.as_slice() else {
        bail!(USAGE);
    };

    let config = TimelineConfig::load(Path::new(config_path))?;
    init_logging(&config.log_level);

    let start = parse_instant(start, "start")?;
    let end = parse_instant(end, "end")?;
    if start > end {
        bail!("start {start} is after end {end}");
    }

    let provider = MemoryProvider::load(Path::new(fixture_path))?;
    let mut aggregator = TimelineAggregator::with_defaults(&config, provider)?;

    info!("Replaying {} cameras over {start} .. {end}", config.cameras.len());
    let outcome = aggregator.refresh(TimeRange::new(start, end)).await;

    let report = Report {
        outcome: &outcome,
        items: aggregator.view().all(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
