use std::collections::BTreeMap;

use crate::coverage::merge::coalesce_sorted;
use crate::models::{Segment, TimelineItem};

/// Convert a recording segment (epoch seconds) into a background item.
/// `None` when either timestamp does not fit in epoch milliseconds.
pub fn segment_to_item(camera_id: &str, segment: &Segment, id: String) -> Option<TimelineItem> {
    let start = segment.start_time.checked_mul(1000)?;
    let end = segment.end_time.checked_mul(1000)?;
    Some(TimelineItem::background(id, camera_id, start, end))
}

/// Merge items into the fewest contiguous blocks, treating gaps of up to
/// `tolerance_secs` as continuous.
///
/// Items are only merged within the same group. Each block keeps the id, kind
/// and payload of its earliest input; its end is the latest end it absorbed.
/// Output is ordered by start, then end.
pub fn compress(
    items: impl IntoIterator<Item = TimelineItem>,
    tolerance_secs: u64,
) -> Vec<TimelineItem> {
    let tolerance_ms = i64::try_from(tolerance_secs.saturating_mul(1000)).unwrap_or(i64::MAX);

    let mut by_group: BTreeMap<String, Vec<TimelineItem>> = BTreeMap::new();
    for item in items {
        by_group.entry(item.group.clone()).or_default().push(item);
    }

    let mut blocks = Vec::new();
    for (_, mut group) in by_group {
        group.sort_by_key(|item| (item.start, item.end_or_start()));

        blocks.extend(coalesce_sorted(group, |block, next| {
            let block_end = block.end_or_start();
            if next.start.saturating_sub(block_end) <= tolerance_ms {
                block.end = Some(block_end.max(next.end_or_start()));
                true
            } else {
                false
            }
        }));
    }

    blocks.sort_by_key(|block| (block.start, block.end_or_start()));
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(id: &str, start: i64, end: i64) -> TimelineItem {
        segment_to_item("front", &Segment::new(id, start, end), format!("front-{id}")).unwrap()
    }

    fn spans(items: &[TimelineItem]) -> Vec<(i64, i64)> {
        items
            .iter()
            .map(|i| (i.start / 1000, i.end_or_start() / 1000))
            .collect()
    }

    #[test]
    fn gap_beyond_tolerance_stays_split() {
        let out = compress(vec![seg("a", 0, 10), seg("b", 12, 20)], 1);
        assert_eq!(spans(&out), vec![(0, 10), (12, 20)]);
    }

    #[test]
    fn gap_within_tolerance_merges() {
        let out = compress(vec![seg("a", 0, 10), seg("b", 12, 20)], 3);
        assert_eq!(spans(&out), vec![(0, 20)]);
        assert_eq!(out[0].id, "front-a");
    }

    #[test]
    fn unsorted_and_overlapping_input() {
        let out = compress(
            vec![seg("c", 50, 60), seg("a", 0, 30), seg("b", 5, 10), seg("d", 100, 110)],
            0,
        );
        assert_eq!(spans(&out), vec![(0, 30), (50, 60), (100, 110)]);
    }

    #[test]
    fn equal_starts_tie_break_on_end() {
        let out = compress(vec![seg("long", 0, 40), seg("short", 0, 5)], 0);
        assert_eq!(spans(&out), vec![(0, 40)]);
        assert_eq!(out[0].id, "front-short");
    }

    #[test]
    fn groups_never_merge_across() {
        let back = segment_to_item("back", &Segment::new("x", 10, 20), "back-x".into()).unwrap();
        let out = compress(vec![seg("a", 0, 15), back], 60);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].group, "front");
        assert_eq!(out[1].group, "back");
    }

    #[test]
    fn recompressing_blocks_is_stable() {
        let first = compress(vec![seg("a", 0, 10), seg("b", 11, 20), seg("c", 100, 120)], 2);
        let again = compress(first.clone(), 2);
        assert_eq!(first, again);
    }

    #[test]
    fn out_of_range_timestamps_are_rejected() {
        let huge = Segment::new("bad", i64::MAX / 100, i64::MAX / 100);
        assert!(segment_to_item("front", &huge, "front-bad".into()).is_none());

        let bad_end = Segment::new("bad", 0, i64::MIN / 10);
        assert!(segment_to_item("front", &bad_end, "front-bad".into()).is_none());
    }

    #[test]
    fn empty_input() {
        assert!(compress(Vec::new(), 10).is_empty());
    }
}
