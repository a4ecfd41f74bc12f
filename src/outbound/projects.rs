//! Project and task resolution for outbound entries
//!
//! The tracking service files every entry under a (project, task) pair. The
//! directory of known projects is populated once per run and never
//! refreshed mid-run.

use std::collections::BTreeMap;

/// Target identifiers for one project on the tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectAssignment {
    pub project_id: i64,
    pub task_id: i64,
}

/// Mapping from project name to its assignment, resolved in three steps:
/// an explicit hint on the bucket, the configured default project, then the
/// first available project (first in name order, so the fallback is at
/// least deterministic).
#[derive(Debug, Clone, Default)]
pub struct ProjectDirectory {
    projects: BTreeMap<String, ProjectAssignment>,
}

impl ProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, assignment: ProjectAssignment) {
        self.projects.insert(name.to_string(), assignment);
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Resolve the assignment for a bucket.
    ///
    /// An explicit hint must match a known project; a dangling hint is a
    /// misconfiguration, not something to paper over with the default.
    /// Without a hint, falls back to the configured default and then to the
    /// first available project. Fails only when nothing can resolve.
    pub fn resolve(
        &self,
        explicit: Option<&str>,
        default: Option<&str>,
    ) -> Result<ProjectAssignment, Box<dyn std::error::Error>> {
        if let Some(name) = explicit {
            return self
                .projects
                .get(name)
                .copied()
                .ok_or_else(|| format!("no project named {} on the tracking service", name).into());
        }

        if let Some(name) = default {
            if let Some(assignment) = self.projects.get(name) {
                return Ok(*assignment);
            }
        }

        if let Some((name, assignment)) = self.projects.iter().next() {
            log::debug!("no project mapping; falling back to first project {}", name);
            return Ok(*assignment);
        }

        Err("no project mapping, no default project and no projects available".into())
    }
}
