//! Submission to the time-tracking service
//!
//! Thin HTTP boundary: fetch the project listing once per run, POST one XML
//! payload per entry. No retries here; a failed submission surfaces to the
//! caller as-is.

use super::entry::TimeEntry;
use super::projects::{ProjectAssignment, ProjectDirectory};
use serde::Deserialize;
use std::time::Duration;

/// Accepts a constructed payload and reports success or failure per item.
pub trait EntrySubmitter {
    fn submit(&self, entry: &TimeEntry) -> Result<(), Box<dyn std::error::Error>>;
}

/// Project listing as returned by the service's daily endpoint.
#[derive(Debug, Deserialize)]
struct DailyResponse {
    projects: Vec<ProjectListing>,
}

#[derive(Debug, Deserialize)]
struct ProjectListing {
    id: i64,
    name: String,
    #[serde(default)]
    tasks: Vec<TaskListing>,
}

#[derive(Debug, Deserialize)]
struct TaskListing {
    id: i64,
}

/// HTTP client for the tracking service.
pub struct HttpSubmitter {
    client: reqwest::blocking::Client,
    server: String,
    username: String,
    password: Option<String>,
}

impl HttpSubmitter {
    pub fn new(
        server: &str,
        username: &str,
        password: Option<&str>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            server: server.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.map(str::to_string),
        })
    }

    /// Fetch the project listing and build the run's project directory.
    pub fn fetch_projects(&self) -> Result<ProjectDirectory, Box<dyn std::error::Error>> {
        let url = format!("{}/daily", self.server);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, self.password.as_deref())
            .header("Accept", "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(format!(
                "project listing request failed with status {}",
                response.status()
            )
            .into());
        }

        let listing: DailyResponse = response.json()?;
        Ok(build_directory(listing.projects))
    }
}

impl EntrySubmitter for HttpSubmitter {
    fn submit(&self, entry: &TimeEntry) -> Result<(), Box<dyn std::error::Error>> {
        let url = format!("{}/daily/add", self.server);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, self.password.as_deref())
            .header("Content-Type", "application/xml")
            .header("Accept", "application/xml")
            .body(entry.to_xml())
            .send()?;

        let status = response.status().as_u16();
        if status != 201 {
            return Err(format!("expected status code 201, received {}", status).into());
        }

        Ok(())
    }
}

/// The first task listed under a project is the one entries are filed
/// against; projects without tasks cannot receive entries and are skipped.
fn build_directory(projects: Vec<ProjectListing>) -> ProjectDirectory {
    let mut directory = ProjectDirectory::new();

    for project in projects {
        match project.tasks.first() {
            Some(task) => directory.insert(
                &project.name,
                ProjectAssignment {
                    project_id: project.id,
                    task_id: task.id,
                },
            ),
            None => {
                log::debug!("project {} has no tasks; skipping", project.name);
            }
        }
    }

    directory
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_from_listing() {
        let json = r#"{
            "projects": [
                {"id": 2825129, "name": "Server Department Work", "tasks": [{"id": 1685399}, {"id": 999}]},
                {"id": 535468, "name": "Miscellaneous", "tasks": [{"id": 1685399}]}
            ]
        }"#;

        let listing: DailyResponse = serde_json::from_str(json).unwrap();
        let directory = build_directory(listing.projects);

        assert_eq!(directory.len(), 2);
        let assignment = directory.resolve(Some("Server Department Work"), None).unwrap();
        assert_eq!(assignment.project_id, 2_825_129);
        // First task wins
        assert_eq!(assignment.task_id, 1_685_399);
    }

    #[test]
    fn test_project_without_tasks_is_skipped() {
        let json = r#"{
            "projects": [
                {"id": 1, "name": "Empty Project", "tasks": []},
                {"id": 2, "name": "Real Project", "tasks": [{"id": 20}]}
            ]
        }"#;

        let listing: DailyResponse = serde_json::from_str(json).unwrap();
        let directory = build_directory(listing.projects);

        assert_eq!(directory.len(), 1);
        assert!(directory.resolve(Some("Empty Project"), None).is_err());
    }

    #[test]
    fn test_server_url_trailing_slash_trimmed() {
        let submitter =
            HttpSubmitter::new("https://tracker.example.com/", "user", Some("pass")).unwrap();
        assert_eq!(submitter.server, "https://tracker.example.com");
    }
}
