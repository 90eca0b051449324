use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::MediaRecord;

/// Order records by start time and drop duplicates, keeping the first
/// occurrence. Records without a start time follow all timed ones, ordered
/// by id. The input is left untouched.
pub fn sort_records(records: &[MediaRecord]) -> Vec<MediaRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(compare_records);
    dedupe_records(sorted)
}

fn compare_records(a: &MediaRecord, b: &MediaRecord) -> Ordering {
    match (a.start_time, b.start_time) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => compare_ids(a.id.as_deref(), b.id.as_deref()),
    }
}

// Missing ids sort last.
fn compare_ids(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Two records are duplicates when both carry the same id; records missing
/// an id only match on full structural equality.
pub fn is_duplicate(a: &MediaRecord, b: &MediaRecord) -> bool {
    match (&a.id, &b.id) {
        (Some(left), Some(right)) => left == right,
        _ => a == b,
    }
}

/// Collapse duplicates anywhere in the sequence, keeping first occurrences
/// in their original order.
pub fn dedupe_records(records: Vec<MediaRecord>) -> Vec<MediaRecord> {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut anonymous: Vec<MediaRecord> = Vec::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        match &record.id {
            Some(id) => {
                if !seen_ids.insert(id.clone()) {
                    continue;
                }
            }
            None => {
                if anonymous.iter().any(|seen| is_duplicate(seen, &record)) {
                    continue;
                }
                anonymous.push(record.clone());
            }
        }
        kept.push(record);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
    }

    fn record(id: Option<&str>, offset_secs: Option<i64>) -> MediaRecord {
        let mut r = MediaRecord::new("driveway");
        r.id = id.map(str::to_string);
        r.start_time = offset_secs.map(|s| base() + TimeDelta::seconds(s));
        r
    }

    fn ids(records: &[MediaRecord]) -> Vec<Option<&str>> {
        records.iter().map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn sorts_ascending_by_start() {
        let input = vec![record(Some("2"), Some(2)), record(Some("1"), Some(1))];
        let out = sort_records(&input);
        assert_eq!(ids(&out), vec![Some("1"), Some("2")]);
        assert_eq!(ids(&input), vec![Some("2"), Some("1")], "input must not be reordered");
    }

    #[test]
    fn untimed_records_follow_timed_ones_in_id_order() {
        let input = vec![
            record(Some("z"), None),
            record(Some("b"), Some(30)),
            record(Some("a"), None),
            record(Some("c"), Some(10)),
        ];
        let out = sort_records(&input);
        assert_eq!(ids(&out), vec![Some("c"), Some("b"), Some("a"), Some("z")]);
    }

    #[test]
    fn all_untimed_sorts_purely_by_id() {
        let input = vec![record(Some("m"), None), record(None, None), record(Some("a"), None)];
        let out = sort_records(&input);
        assert_eq!(ids(&out), vec![Some("a"), Some("m"), None]);
    }

    #[test]
    fn duplicate_ids_keep_first_seen() {
        let mut later = record(Some("1"), Some(1));
        later.label = Some("car".into());
        let input = vec![record(Some("1"), Some(1)), later, record(Some("2"), Some(5))];

        let out = sort_records(&input);
        assert_eq!(ids(&out), vec![Some("1"), Some("2")]);
        assert_eq!(out[0].label, None);
    }

    #[test]
    fn id_less_records_dedupe_only_on_structural_equality() {
        let a = record(None, Some(3));
        let mut b = record(None, Some(3));
        b.label = Some("person".into());
        let input = vec![a.clone(), b.clone(), a.clone()];

        let out = sort_records(&input);
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn duplicate_check_rules() {
        let with_id = record(Some("1"), Some(1));
        let mut same_id_other_fields = record(Some("1"), Some(99));
        same_id_other_fields.has_clip = true;
        assert!(is_duplicate(&with_id, &same_id_other_fields));

        let anonymous = record(None, Some(1));
        assert!(!is_duplicate(&with_id, &anonymous));
        assert!(is_duplicate(&anonymous, &anonymous.clone()));
    }
}
