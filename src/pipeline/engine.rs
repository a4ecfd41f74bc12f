//! Run orchestration
//!
//! One `process()` call is one run: it takes an already-fetched batch of
//! raw items and walks them through normalize → staleness filter → seen
//! filter → day/key grouping → bucket aggregation. Everything is
//! synchronous and single-threaded; the seen store is the only shared
//! mutable resource and the caller owns its lifecycle.

use super::bucket::{aggregate_day, TimeBucket};
use super::filter::{filter_seen, filter_stale, FilterCounters};
use super::group::group_by_day_and_key;
use super::normalize::normalize;
use super::store::SeenStore;
use super::types::RawActivity;
use crate::config::RunConfig;
use chrono::{DateTime, Utc};

/// What one run did, reported back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Buckets produced (one outbound entry each)
    pub recorded: usize,
    /// Records excluded because they had already been seen
    pub already_seen: u64,
    /// Records excluded because they were too old
    pub too_old: u64,
}

/// The aggregation pipeline, wired to a config and a seen store.
pub struct Pipeline<'a> {
    config: &'a RunConfig,
    store: &'a mut dyn SeenStore,

    /// Timestamp function (for testing with a fixed clock)
    now_fn: Box<dyn Fn() -> DateTime<Utc>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a RunConfig, store: &'a mut dyn SeenStore) -> Self {
        Self::with_clock(config, store, Box::new(Utc::now))
    }

    /// Create a pipeline with a custom clock, used by tests to pin "now".
    pub fn with_clock(
        config: &'a RunConfig,
        store: &'a mut dyn SeenStore,
        now_fn: Box<dyn Fn() -> DateTime<Utc>>,
    ) -> Self {
        Self {
            config,
            store,
            now_fn,
        }
    }

    /// Run the full pipeline over one batch.
    pub fn process(
        &mut self,
        batch: Vec<RawActivity>,
    ) -> Result<(Vec<TimeBucket>, RunSummary), Box<dyn std::error::Error>> {
        let now = (self.now_fn)();
        let raw_count = batch.len();

        let records: Vec<_> = batch
            .into_iter()
            .filter_map(|raw| normalize(raw, self.config, now))
            .collect();
        log::debug!(
            "normalized {} of {} raw items",
            records.len(),
            raw_count
        );

        let mut counters = FilterCounters::default();
        let records = filter_stale(records, now, self.config.max_age(), &mut counters);
        let records = filter_seen(records, self.store, &mut counters)?;

        let mut buckets = Vec::new();
        for (day, groups) in group_by_day_and_key(records) {
            buckets.extend(aggregate_day(day, groups, self.config.bucket_ceiling_secs));
        }

        let summary = RunSummary {
            recorded: buckets.len(),
            already_seen: counters.already_seen,
            too_old: counters.too_old,
        };

        Ok((buckets, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::store::MemorySeenStore;
    use crate::pipeline::types::{RawCalendarEvent, RawCommit, RawCompletion, RawWorklog};
    use chrono::TimeZone;

    fn test_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 5, 16, 18, 0, 0).unwrap()
    }

    fn test_config() -> RunConfig {
        RunConfig {
            identity: "first.last@example.com".to_string(),
            work_marker: Some("MM".to_string()),
            ..RunConfig::default()
        }
    }

    fn make_commit(repo: &str, branch: &str, date: &str, message: &str) -> RawActivity {
        RawActivity::Git(RawCommit {
            repo: repo.to_string(),
            branch: branch.to_string(),
            author: Some("first.last@example.com".to_string()),
            date: Some(date.to_string()),
            message: message.to_string(),
        })
    }

    fn run(batch: Vec<RawActivity>, store: &mut MemorySeenStore) -> (Vec<TimeBucket>, RunSummary) {
        let config = test_config();
        let mut pipeline = Pipeline::with_clock(&config, store, Box::new(test_now));
        pipeline.process(batch).unwrap()
    }

    #[test]
    fn test_commits_on_one_branch_merge() {
        let batch = vec![
            make_commit("foo", "main", "2013-05-16 09:00:00 +0000", "first change"),
            make_commit("foo", "main", "2013-05-16 11:00:00 +0000", "second change"),
            make_commit("foo", "feature", "2013-05-16 12:00:00 +0000", "branch work"),
        ];

        let mut store = MemorySeenStore::new();
        let (buckets, summary) = run(batch, &mut store);

        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.already_seen, 0);
        assert_eq!(summary.too_old, 0);

        assert_eq!(buckets[0].key.as_deref(), Some("foo/feature"));
        assert_eq!(buckets[0].seconds, 600);
        assert_eq!(buckets[1].key.as_deref(), Some("foo/main"));
        assert_eq!(buckets[1].seconds, 1200);
        assert_eq!(
            buckets[1].notes,
            vec![
                "foo/main".to_string(),
                "first change".to_string(),
                "second change".to_string()
            ]
        );
    }

    #[test]
    fn test_second_run_excludes_everything() {
        // Idempotence: the same batch queued twice records nothing new
        let batch = vec![
            make_commit("foo", "main", "2013-05-16 09:00:00 +0000", "first change"),
            make_commit("foo", "main", "2013-05-16 11:00:00 +0000", "second change"),
        ];

        let mut store = MemorySeenStore::new();
        let (_, first) = run(batch.clone(), &mut store);
        assert_eq!(first.recorded, 1);

        let (buckets, second) = run(batch, &mut store);
        assert!(buckets.is_empty());
        assert_eq!(second.recorded, 0);
        assert_eq!(second.already_seen, 2);
    }

    #[test]
    fn test_stale_items_counted_not_recorded() {
        let batch = vec![
            make_commit("foo", "main", "2013-05-16 09:00:00 +0000", "fresh"),
            make_commit("foo", "main", "2013-05-01 09:00:00 +0000", "ancient"),
        ];

        let mut store = MemorySeenStore::new();
        let (buckets, summary) = run(batch, &mut store);

        assert_eq!(summary.too_old, 1);
        assert_eq!(summary.recorded, 1);
        assert_eq!(buckets[0].notes, vec!["foo/main".to_string(), "fresh".to_string()]);
    }

    #[test]
    fn test_mixed_sources_flow_through() {
        let batch = vec![
            make_commit("foo", "main", "2013-05-16 09:00:00 +0000", "a change"),
            RawActivity::Calendar(RawCalendarEvent {
                uid: "uid-1".to_string(),
                title: "planning".to_string(),
                attendee_email: "first.last@example.com".to_string(),
                start_date: Some("2013-05-16 13:00:00+00:00".to_string()),
                end_date: Some("2013-05-16 15:00:00+00:00".to_string()),
                project_tag: None,
            }),
            RawActivity::IssueTracker(RawWorklog {
                issue_key: "MMSANDBOX-2803".to_string(),
                comment: "foo!".to_string(),
                time_spent_seconds: 600,
                created: Some("2013-05-16T14:47:29Z".to_string()),
            }),
            RawActivity::TaskManager(RawCompletion {
                project: vec![Some("MM".to_string()), None, Some("stuff".to_string())],
                task: "do something dumb".to_string(),
                date_completed: Some("2013-05-16T18:25:45Z".to_string()),
                estimated_minutes: Some(30),
                disposition: Some("completed".to_string()),
            }),
        ];

        let mut store = MemorySeenStore::new();
        let (buckets, summary) = run(batch, &mut store);

        assert_eq!(summary.recorded, 4);

        // Calendar bucket has no key and no label note
        let calendar = buckets.iter().find(|b| b.key.is_none()).unwrap();
        assert_eq!(calendar.notes, vec!["planning".to_string()]);
        assert_eq!(calendar.seconds, 7200);

        // All buckets share the day and honor key isolation
        for bucket in &buckets {
            assert_eq!(bucket.day.to_string(), "2013-05-16");
        }
    }

    #[test]
    fn test_excluded_items_produce_no_buckets() {
        let batch = vec![RawActivity::TaskManager(RawCompletion {
            project: vec![None],
            task: "yc62CRnLTzreaDW".to_string(),
            date_completed: None,
            estimated_minutes: None,
            disposition: Some("deleted".to_string()),
        })];

        let mut store = MemorySeenStore::new();
        let (buckets, summary) = run(batch, &mut store);

        assert!(buckets.is_empty());
        assert_eq!(summary, RunSummary::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_groups_spanning_days_keep_their_own_day() {
        // Same key on two days: two buckets, each on its own day
        let batch = vec![
            make_commit("foo", "main", "2013-05-16 09:00:00 +0000", "day one"),
            make_commit("foo", "main", "2013-05-17 09:00:00 +0000", "day two"),
        ];

        let mut store = MemorySeenStore::new();
        let (buckets, _) = run(batch, &mut store);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day.to_string(), "2013-05-16");
        assert_eq!(buckets[1].day.to_string(), "2013-05-17");
    }
}
