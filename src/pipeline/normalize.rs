//! Per-source normalization into canonical activity records
//!
//! Each adapter maps one raw item to zero or one record. `None` means the
//! item is excluded (a deleted task, somebody else's calendar event, a
//! non-work project). Exclusion is an expected outcome, not an error.

use super::types::{
    parse_timestamp, ActivityRecord, ActivitySource, RawActivity, RawCalendarEvent, RawCommit,
    RawCompletion, RawWorklog,
};
use crate::config::RunConfig;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Normalize one raw item, routing to the adapter for its source.
///
/// `now` backfills missing end dates so every surviving record lands on a
/// resolvable calendar day.
pub fn normalize(raw: RawActivity, config: &RunConfig, now: DateTime<Utc>) -> Option<ActivityRecord> {
    match raw {
        RawActivity::Git(commit) => normalize_commit(commit, config, now),
        RawActivity::Calendar(event) => normalize_calendar_event(event, config, now),
        RawActivity::IssueTracker(worklog) => normalize_worklog(worklog, now),
        RawActivity::TaskManager(completion) => normalize_completion(completion, config, now),
    }
}

/// Commit time alone carries no duration, so every commit is credited a
/// configured flat estimate.
fn normalize_commit(
    commit: RawCommit,
    config: &RunConfig,
    now: DateTime<Utc>,
) -> Option<ActivityRecord> {
    let end_date = commit
        .date
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);

    let mut extras = BTreeMap::new();
    extras.insert("repo".to_string(), commit.repo.clone());
    extras.insert("branch".to_string(), commit.branch.clone());
    if let Some(author) = commit.author {
        extras.insert("author".to_string(), author);
    }

    Some(ActivityRecord {
        source: ActivitySource::Git,
        key: format!("{}/{}", commit.repo, commit.branch),
        end_date,
        seconds: config.commit_seconds,
        notes: vec![commit.message],
        project: None,
        extras,
    })
}

/// Only events addressed to the configured identity are kept. Duration is
/// the event span; an event missing either boundary still passes with zero
/// seconds so it stays visible in the notes.
fn normalize_calendar_event(
    event: RawCalendarEvent,
    config: &RunConfig,
    now: DateTime<Utc>,
) -> Option<ActivityRecord> {
    if event.attendee_email != config.identity {
        log::debug!(
            "calendar event {} is for {}, not {}; skipping",
            event.uid,
            event.attendee_email,
            config.identity
        );
        return None;
    }

    let start = event.start_date.as_deref().and_then(parse_timestamp);
    let end = event.end_date.as_deref().and_then(parse_timestamp);
    let seconds = match (start, end) {
        (Some(start), Some(end)) => (end - start).num_seconds().max(0),
        _ => 0,
    };

    Some(ActivityRecord {
        source: ActivitySource::Calendar,
        key: event.uid,
        end_date: end.unwrap_or(now),
        seconds,
        notes: vec![event.title],
        project: event.project_tag,
        extras: BTreeMap::new(),
    })
}

/// Worklogs carry their duration verbatim and group under the issue key.
fn normalize_worklog(worklog: RawWorklog, now: DateTime<Utc>) -> Option<ActivityRecord> {
    if worklog.time_spent_seconds < 0 {
        log::debug!(
            "worklog on {} reports negative time; skipping",
            worklog.issue_key
        );
        return None;
    }

    let end_date = worklog
        .created
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);

    Some(ActivityRecord {
        source: ActivitySource::IssueTracker,
        key: worklog.issue_key,
        end_date,
        seconds: worklog.time_spent_seconds,
        notes: vec![worklog.comment],
        project: None,
        extras: BTreeMap::new(),
    })
}

/// Deleted tasks and non-work projects are excluded; the rest group under
/// the slash-joined project path.
fn normalize_completion(
    completion: RawCompletion,
    config: &RunConfig,
    now: DateTime<Utc>,
) -> Option<ActivityRecord> {
    if completion.disposition.as_deref() == Some("deleted") {
        log::debug!("task {:?} was deleted; skipping", completion.task);
        return None;
    }

    let segments: Vec<&str> = completion
        .project
        .iter()
        .flatten()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(marker) = &config.work_marker {
        if !segments.iter().any(|s| *s == marker.as_str()) {
            log::debug!("task {:?} is not in a work project; skipping", completion.task);
            return None;
        }
    }

    let key = segments.join("/");
    if key.is_empty() {
        log::debug!("task {:?} has no project path; skipping", completion.task);
        return None;
    }

    if config.exclude_markers.iter().any(|m| key.contains(m)) {
        log::debug!("task {:?} is in an excluded project; skipping", completion.task);
        return None;
    }

    let end_date = completion
        .date_completed
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);

    let mut extras = BTreeMap::new();
    if let Some(disposition) = completion.disposition {
        extras.insert("disposition".to_string(), disposition);
    }

    Some(ActivityRecord {
        source: ActivitySource::TaskManager,
        key,
        end_date,
        seconds: completion.estimated_minutes.unwrap_or(0).max(0) * 60,
        notes: vec![completion.task],
        project: None,
        extras,
    })
}
