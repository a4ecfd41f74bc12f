//! Ceiling-bounded bucket aggregation
//!
//! Each (day, key) group merges into buckets capped at a configured
//! duration. When a record would push a non-empty bucket past the ceiling,
//! the bucket is sealed and a fresh one opens for that record. A single
//! record larger than the ceiling therefore still lands, alone, in its own
//! bucket, and the walk always makes progress.

use super::types::ActivityRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One consolidated time entry in the making.
///
/// Built incrementally while walking a group; sealed (pushed to the output)
/// on overflow or at end of group. `key` is `None` for sources that do not
/// aggregate, such as calendar events.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBucket {
    pub day: NaiveDate,
    pub key: Option<String>,
    pub notes: Vec<String>,
    pub seconds: i64,
    pub project: Option<String>,
}

impl TimeBucket {
    /// Open a bucket for a group. Key-bearing buckets start with the key
    /// itself as a synthetic label note.
    fn seeded(day: NaiveDate, key: Option<&str>) -> Self {
        Self {
            day,
            key: key.map(str::to_string),
            notes: key.map(str::to_string).into_iter().collect(),
            seconds: 0,
            project: None,
        }
    }

    fn merge(&mut self, record: &ActivityRecord) {
        self.notes.extend(record.notes.iter().cloned());
        self.seconds += record.seconds;
        if self.project.is_none() {
            self.project = record.project.clone();
        }
    }
}

/// Aggregate every key group of one day, keys in sorted order.
pub fn aggregate_day(
    day: NaiveDate,
    groups: BTreeMap<String, Vec<ActivityRecord>>,
    ceiling_secs: i64,
) -> Vec<TimeBucket> {
    let mut buckets = Vec::new();
    for (key, records) in groups {
        buckets.extend(aggregate_group(day, &key, &records, ceiling_secs));
    }
    buckets
}

/// Merge one (day, key) group into ceiling-bounded buckets.
pub fn aggregate_group(
    day: NaiveDate,
    key: &str,
    records: &[ActivityRecord],
    ceiling_secs: i64,
) -> Vec<TimeBucket> {
    let first = match records.first() {
        Some(first) => first,
        None => return Vec::new(),
    };

    // Non-aggregating sources keep one bucket per record, unlabeled.
    if !first.source.aggregates_by_key() {
        return records
            .iter()
            .map(|record| {
                let mut bucket = TimeBucket::seeded(day, None);
                bucket.merge(record);
                bucket
            })
            .collect();
    }

    let mut sealed = Vec::new();
    let mut bucket = TimeBucket::seeded(day, Some(key));
    let mut merged = 0usize;

    for record in records {
        if merged > 0 && bucket.seconds + record.seconds > ceiling_secs {
            sealed.push(bucket);
            bucket = TimeBucket::seeded(day, Some(key));
            merged = 0;
        }
        bucket.merge(record);
        merged += 1;
    }

    sealed.push(bucket);
    sealed
}
