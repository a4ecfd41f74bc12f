//! Canonical activity records and the raw per-source input schema

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where an activity record came from.
///
/// Calendar events do not aggregate by key: every event stands alone as its
/// own time entry, while the other sources merge same-key records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivitySource {
    #[serde(rename = "git")]
    Git,
    #[serde(rename = "calendar")]
    Calendar,
    #[serde(rename = "issue-tracker")]
    IssueTracker,
    #[serde(rename = "task-manager")]
    TaskManager,
}

impl ActivitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivitySource::Git => "git",
            ActivitySource::Calendar => "calendar",
            ActivitySource::IssueTracker => "issue-tracker",
            ActivitySource::TaskManager => "task-manager",
        }
    }

    /// Whether records from this source merge into shared per-key buckets.
    pub fn aggregates_by_key(&self) -> bool {
        !matches!(self, ActivitySource::Calendar)
    }
}

/// One raw item as handed over by a fetcher, tagged by source.
///
/// Fetchers run before the pipeline and produce a JSON array of these; the
/// pipeline never talks to git, calendar or tracker APIs itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum RawActivity {
    #[serde(rename = "git")]
    Git(RawCommit),
    #[serde(rename = "calendar")]
    Calendar(RawCalendarEvent),
    #[serde(rename = "issue-tracker")]
    IssueTracker(RawWorklog),
    #[serde(rename = "task-manager")]
    TaskManager(RawCompletion),
}

/// A commit pulled from version-control history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    pub repo: String,
    pub branch: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Commit timestamp, e.g. "2013-05-16 15:52:52 +0000"
    #[serde(default)]
    pub date: Option<String>,
    pub message: String,
}

/// A calendar event with its target attendee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCalendarEvent {
    pub uid: String,
    pub title: String,
    pub attendee_email: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Project tag the attendee left on the invite, if any
    #[serde(default)]
    pub project_tag: Option<String>,
}

/// A worklog entry scraped from the issue tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawWorklog {
    pub issue_key: String,
    pub comment: String,
    pub time_spent_seconds: i64,
    #[serde(default)]
    pub created: Option<String>,
}

/// A completed (or deleted) task from the task manager's export.
///
/// `project` is the folder path to the task; exports leave gaps in the
/// hierarchy as nulls, so segments are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCompletion {
    #[serde(default)]
    pub project: Vec<Option<String>>,
    pub task: String,
    #[serde(default)]
    pub date_completed: Option<String>,
    #[serde(default)]
    pub estimated_minutes: Option<i64>,
    #[serde(default)]
    pub disposition: Option<String>,
}

/// The common shape every source is normalized into.
///
/// Immutable once produced by the normalizer; the only mutation the pipeline
/// ever performs on raw input is backfilling a missing end date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub source: ActivitySource,
    /// Stable grouping identity (repo/branch, event uid, issue key,
    /// project path). Never empty.
    pub key: String,
    pub end_date: DateTime<Utc>,
    pub seconds: i64,
    /// Free-text notes, insertion order significant.
    pub notes: Vec<String>,
    /// Explicit outbound project hint, when the source carries one.
    #[serde(default)]
    pub project: Option<String>,
    /// Source-specific attributes (author, branch, disposition). Opaque to
    /// the aggregator.
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
}

impl ActivityRecord {
    /// Calendar day this record lands on.
    pub fn day(&self) -> NaiveDate {
        self.end_date.date_naive()
    }

    /// Full field set as name/value pairs, for fingerprinting.
    pub fn fields(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("source".to_string(), self.source.as_str().to_string()),
            ("key".to_string(), self.key.clone()),
            ("end_date".to_string(), self.end_date.to_rfc3339()),
            ("seconds".to_string(), self.seconds.to_string()),
            ("notes".to_string(), self.notes.join("\u{1f}")),
        ];
        if let Some(project) = &self.project {
            pairs.push(("project".to_string(), project.clone()));
        }
        for (name, value) in &self.extras {
            pairs.push((name.clone(), value.clone()));
        }
        pairs
    }
}

/// Parse the timestamp formats the fetchers are known to emit.
///
/// Accepts RFC 3339, git-log style ("%Y-%m-%d %H:%M:%S %z" with or without
/// the space before the offset), naive datetimes and bare dates. Naive
/// values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%d %H:%M:%S%.f %z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ] {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}
