//! Staleness and duplicate filtering
//!
//! Both filters count what they drop; the counts surface in the run summary
//! rather than being logged here.

use super::store::SeenStore;
use super::types::ActivityRecord;
use chrono::{DateTime, Duration, Utc};

/// Records dropped by the filtering stages, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounters {
    pub too_old: u64,
    pub already_seen: u64,
}

/// Keep only records whose end date lies within `max_age` of `now`, in
/// either direction.
pub fn filter_stale(
    records: Vec<ActivityRecord>,
    now: DateTime<Utc>,
    max_age: Duration,
    counters: &mut FilterCounters,
) -> Vec<ActivityRecord> {
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        let age = (now - record.end_date).abs();
        if age <= max_age {
            kept.push(record);
        } else {
            counters.too_old += 1;
            log::debug!("record {} is too old to be queued", record.key);
        }
    }

    kept
}

/// Drop records whose fingerprint is already on record; insert the rest.
///
/// Running the same batch twice therefore excludes it entirely the second
/// time.
pub fn filter_seen(
    records: Vec<ActivityRecord>,
    store: &mut dyn SeenStore,
    counters: &mut FilterCounters,
) -> Result<Vec<ActivityRecord>, Box<dyn std::error::Error>> {
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        let fingerprint = record.fingerprint();
        if store.contains(&fingerprint)? {
            counters.already_seen += 1;
            log::debug!("record {} already seen", record.key);
        } else {
            store.insert(&fingerprint, &record)?;
            kept.push(record);
        }
    }

    Ok(kept)
}
