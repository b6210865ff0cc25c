// Board records shared by the store adapter, the session layer and the views.
// Field names follow the persisted document layout (camelCase).

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Partner organization that authored a record. Display-only, not an access boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Company {
    Ello,
    Stacia,
}

impl Company {
    pub fn as_str(&self) -> &'static str {
        match self {
            Company::Ello => "ello",
            Company::Stacia => "stacia",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Company::Ello => "Ello.one",
            Company::Stacia => "Stacia Corp",
        }
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow position of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "queue")]
    Queue,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl ProjectStatus {
    /// Workflow order.
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Queue,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Queue => "queue",
            ProjectStatus::InProgress => "in-progress",
            ProjectStatus::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Queue => "Queue",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(ProjectStatus::Queue),
            "in-progress" | "in_progress" | "inprogress" => Ok(ProjectStatus::InProgress),
            "completed" => Ok(ProjectStatus::Completed),
            other => Err(format!(
                "unknown status '{other}' (expected queue, in-progress or completed)"
            )),
        }
    }
}

/// An authenticated identity. Never carries a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub company: Company,
}

/// Records that live under a store-generated key. The key is not part of the
/// stored value and is attached after decoding.
pub trait BoardRecord: serde::de::DeserializeOwned + Send + 'static {
    fn attach_id(&mut self, id: String);
    fn record_id(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: ProjectStatus,
    pub created_at: i64,
    pub created_by: String,
    pub company: Company,
}

impl Project {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

impl BoardRecord for Project {
    fn attach_id(&mut self, id: String) {
        self.id = id;
    }

    fn record_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    #[serde(skip_serializing, default)]
    pub id: String,
    pub project_id: String,
    pub content: String,
    pub created_at: i64,
    pub created_by: String,
    pub company: Company,
}

impl Update {
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

impl BoardRecord for Update {
    fn attach_id(&mut self, id: String) {
        self.id = id;
    }

    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Caller-side input checks. The store adapter never runs these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("project title must not be empty")]
    EmptyTitle,
    #[error("update content must not be empty")]
    EmptyContent,
    #[error("update must reference a project")]
    MissingProject,
}

/// Input for creating a project. `status` falls back to `queue`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub status: Option<ProjectStatus>,
}

impl NewProject {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUpdate {
    pub project_id: String,
    pub content: String,
}

impl NewUpdate {
    pub fn new(project_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_id.trim().is_empty() {
            return Err(ValidationError::MissingProject);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        Ok(())
    }
}
