//! Outbound conversion and submission
//!
//! Everything past the aggregation core: resolving a bucket to a project
//! and task on the tracking service, building the submission payload, and
//! the HTTP boundary itself.

pub mod entry;
pub mod projects;
pub mod submit;

pub use entry::{convert_bucket, TimeEntry};
pub use projects::{ProjectAssignment, ProjectDirectory};
pub use submit::{EntrySubmitter, HttpSubmitter};
