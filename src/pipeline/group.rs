//! Day and key grouping
//!
//! Records partition first by calendar day, then by key within the day.
//! Both levels are ordered maps so a byte-identical input batch always
//! produces the same iteration order downstream.

use super::types::ActivityRecord;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// day -> key -> records, in input order within each group
pub type DayGroups = BTreeMap<NaiveDate, BTreeMap<String, Vec<ActivityRecord>>>;

/// Partition records by day, then by key. Append order inside each group
/// follows input order.
pub fn group_by_day_and_key(records: Vec<ActivityRecord>) -> DayGroups {
    let mut days: DayGroups = BTreeMap::new();

    for record in records {
        days.entry(record.day())
            .or_default()
            .entry(record.key.clone())
            .or_default()
            .push(record);
    }

    days
}
