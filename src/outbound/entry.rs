//! Outbound time-entry payloads
//!
//! Converts an aggregated bucket plus a resolved project assignment into
//! the shape the tracking service accepts: hours instead of seconds, the
//! bucket day as the spend date, and the notes joined into one
//! bullet-separated block.

use super::projects::{ProjectAssignment, ProjectDirectory};
use crate::pipeline::TimeBucket;
use chrono::NaiveDate;
use std::fmt;

/// One entry ready for submission.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub hours: f64,
    pub notes: Vec<String>,
    pub spent_at: NaiveDate,
    pub project_id: i64,
    pub task_id: i64,
}

impl TimeEntry {
    pub fn from_bucket(bucket: &TimeBucket, assignment: ProjectAssignment) -> Self {
        Self {
            hours: bucket.seconds as f64 / 3600.0,
            notes: bucket.notes.clone(),
            spent_at: bucket.day,
            project_id: assignment.project_id,
            task_id: assignment.task_id,
        }
    }

    /// Notes joined with a bullet separator, trailing newline included.
    pub fn notes_text(&self) -> String {
        format!("{}\n", self.notes.join("\n\u{2022} "))
    }

    /// Render the submission payload.
    pub fn to_xml(&self) -> String {
        format!(
            "<request>\
             <notes>{}</notes>\
             <hours>{}</hours>\
             <project_id type=\"integer\">{}</project_id>\
             <task_id type=\"integer\">{}</task_id>\
             <spent_at type=\"date\">{}</spent_at>\
             </request>",
            escape_xml(&self.notes_text()),
            self.hours,
            self.project_id,
            self.task_id,
            self.spent_at,
        )
    }
}

impl fmt::Display for TimeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{}/{}/{} on {}",
            self.notes, self.hours, self.project_id, self.task_id, self.spent_at
        )
    }
}

/// Resolve a bucket's project and build its entry.
pub fn convert_bucket(
    bucket: &TimeBucket,
    directory: &ProjectDirectory,
    default_project: Option<&str>,
) -> Result<TimeEntry, Box<dyn std::error::Error>> {
    let assignment = directory.resolve(bucket.project.as_deref(), default_project)?;
    Ok(TimeEntry::from_bucket(bucket, assignment))
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
