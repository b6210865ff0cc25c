// Local read projection of the store
//
// A `Board` is rebuilt from whole snapshots and never edited record by record.
// Snapshot maps are unordered, so every list the board hands out is sorted
// here rather than relying on arrival order.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Project, ProjectStatus, Update};

/// Decoded collection snapshot: record id -> record.
pub type Snapshot<T> = HashMap<String, T>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    projects: Snapshot<Project>,
    updates: Snapshot<Update>,
    projects_loaded: bool,
    updates_loaded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub queue: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn get(&self, status: ProjectStatus) -> usize {
        match status {
            ProjectStatus::Queue => self.queue,
            ProjectStatus::InProgress => self.in_progress,
            ProjectStatus::Completed => self.completed,
        }
    }

    pub fn total(&self) -> usize {
        self.queue + self.in_progress + self.completed
    }
}

/// Projects split by status; the three lists are disjoint and cover the board.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPartition<'a> {
    pub queue: Vec<&'a Project>,
    pub in_progress: Vec<&'a Project>,
    pub completed: Vec<&'a Project>,
}

impl<'a> StatusPartition<'a> {
    pub fn column(&self, status: ProjectStatus) -> &[&'a Project] {
        match status {
            ProjectStatus::Queue => &self.queue,
            ProjectStatus::InProgress => &self.in_progress,
            ProjectStatus::Completed => &self.completed,
        }
    }
}

fn oldest_first(a: &Project, b: &Project) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

impl Board {
    pub fn new(projects: Snapshot<Project>, updates: Snapshot<Update>) -> Self {
        Self {
            projects,
            updates,
            projects_loaded: true,
            updates_loaded: true,
        }
    }

    pub fn from_records(
        projects: impl IntoIterator<Item = Project>,
        updates: impl IntoIterator<Item = Update>,
    ) -> Self {
        Self::new(
            projects.into_iter().map(|p| (p.id.clone(), p)).collect(),
            updates.into_iter().map(|u| (u.id.clone(), u)).collect(),
        )
    }

    pub fn replace_projects(&mut self, projects: Snapshot<Project>) {
        self.projects = projects;
        self.projects_loaded = true;
    }

    pub fn replace_updates(&mut self, updates: Snapshot<Update>) {
        self.updates = updates;
        self.updates_loaded = true;
    }

    /// At least one projects snapshot has arrived.
    pub fn is_loaded(&self) -> bool {
        self.projects_loaded
    }

    pub fn updates_loaded(&self) -> bool {
        self.updates_loaded
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    pub fn update_count(&self) -> usize {
        self.updates.len()
    }

    /// All projects, oldest first.
    pub fn projects(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| oldest_first(a, b));
        projects
    }

    pub fn projects_with_status(&self, status: ProjectStatus) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self
            .projects
            .values()
            .filter(|p| p.status == status)
            .collect();
        projects.sort_by(|a, b| oldest_first(a, b));
        projects
    }

    pub fn partition(&self) -> StatusPartition<'_> {
        let mut partition = StatusPartition::default();
        for project in self.projects() {
            match project.status {
                ProjectStatus::Queue => partition.queue.push(project),
                ProjectStatus::InProgress => partition.in_progress.push(project),
                ProjectStatus::Completed => partition.completed.push(project),
            }
        }
        partition
    }

    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for project in self.projects.values() {
            match project.status {
                ProjectStatus::Queue => counts.queue += 1,
                ProjectStatus::InProgress => counts.in_progress += 1,
                ProjectStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }

    /// Newest projects first, at most `limit`.
    pub fn recent_projects(&self, limit: usize) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.projects.values().collect();
        projects.sort_by(|a, b| oldest_first(b, a));
        projects.truncate(limit);
        projects
    }

    /// Updates posted against `project_id`, newest first.
    pub fn project_updates(&self, project_id: &str) -> Vec<&Update> {
        let mut updates: Vec<&Update> = self
            .updates
            .values()
            .filter(|u| u.project_id == project_id)
            .collect();
        updates.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        updates
    }

    /// The project an update refers to, if it still exists.
    pub fn update_target(&self, update: &Update) -> Option<&Project> {
        self.projects.get(&update.project_id)
    }

    /// Updates whose project is not on the board.
    pub fn dangling_updates(&self) -> Vec<&Update> {
        let mut dangling: Vec<&Update> = self
            .updates
            .values()
            .filter(|u| self.update_target(u).is_none())
            .collect();
        dangling.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        dangling
    }
}
