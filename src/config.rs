//! Run configuration from environment variables

use std::env;

/// Configuration for a pipeline run
///
/// Loaded from environment variables with sensible defaults. Passed
/// explicitly into the components that need it; there are no configuration
/// globals.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Identity the calendar source is filtered against (attendee email)
    pub identity: String,

    /// Project path segment that marks billable task-manager work.
    /// When unset, every completion passes the marker check.
    pub work_marker: Option<String>,

    /// Substrings that exclude a task-manager project path outright
    pub exclude_markers: Vec<String>,

    /// Seconds credited to a commit (commit time alone carries no duration)
    pub commit_seconds: i64,

    /// Maximum record age in days before it is dropped as stale
    pub max_age_days: i64,

    /// Hard per-bucket duration ceiling in seconds
    pub bucket_ceiling_secs: i64,

    /// Fallback project name when a bucket carries no explicit mapping
    pub default_project: Option<String>,

    /// Time-tracking service base URL
    pub server: Option<String>,

    /// Service credentials
    pub username: Option<String>,
    pub password: Option<String>,

    /// Path to the SQLite file holding the seen-record set
    pub state_db_path: String,
}

impl RunConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `TIMEFLOW_IDENTITY` (default: empty)
    /// - `TIMEFLOW_WORK_MARKER` (default: unset)
    /// - `TIMEFLOW_EXCLUDE_MARKERS` (comma-separated, default: empty)
    /// - `TIMEFLOW_COMMIT_SECONDS` (default: 600)
    /// - `TIMEFLOW_MAX_AGE_DAYS` (default: 4)
    /// - `TIMEFLOW_BUCKET_CEILING_SECS` (default: 14400)
    /// - `TIMEFLOW_DEFAULT_PROJECT` (default: unset)
    /// - `TIMEFLOW_SERVER`, `TIMEFLOW_USERNAME`, `TIMEFLOW_PASSWORD`
    /// - `TIMEFLOW_STATE_DB` (default: data/timeflow-seen.db)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            identity: env::var("TIMEFLOW_IDENTITY").unwrap_or(defaults.identity),

            work_marker: env::var("TIMEFLOW_WORK_MARKER").ok().filter(|s| !s.is_empty()),

            exclude_markers: env::var("TIMEFLOW_EXCLUDE_MARKERS")
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            commit_seconds: env::var("TIMEFLOW_COMMIT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.commit_seconds),

            max_age_days: env::var("TIMEFLOW_MAX_AGE_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_age_days),

            bucket_ceiling_secs: env::var("TIMEFLOW_BUCKET_CEILING_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bucket_ceiling_secs),

            default_project: env::var("TIMEFLOW_DEFAULT_PROJECT")
                .ok()
                .filter(|s| !s.is_empty()),

            server: env::var("TIMEFLOW_SERVER").ok().filter(|s| !s.is_empty()),
            username: env::var("TIMEFLOW_USERNAME").ok(),
            password: env::var("TIMEFLOW_PASSWORD").ok(),

            state_db_path: env::var("TIMEFLOW_STATE_DB").unwrap_or(defaults.state_db_path),
        }
    }

    /// Staleness window as a duration
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.max_age_days)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            work_marker: None,
            exclude_markers: Vec::new(),
            commit_seconds: 600,
            max_age_days: 4,
            bucket_ceiling_secs: 14_400,
            default_project: None,
            server: None,
            username: None,
            password: None,
            state_db_path: "data/timeflow-seen.db".to_string(),
        }
    }
}
