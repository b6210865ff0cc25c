// Project status transitions
//
//    queue  --(advance)-->  in-progress  --(advance)-->  completed
//           <--(retreat)--              <--(retreat)--
//
// Creation may place a project in any status. No status is terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ProjectStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusMove {
    Advance,
    Retreat,
}

impl fmt::Display for StatusMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMove::Advance => f.write_str("advance"),
            StatusMove::Retreat => f.write_str("retreat"),
        }
    }
}

/// Verdict on moving a project from one status to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionCheck {
    /// Target equals the current status.
    NoOp,
    Allowed(StatusMove),
    Forbidden,
}

impl ProjectStatus {
    pub fn next(self) -> Option<ProjectStatus> {
        match self {
            ProjectStatus::Queue => Some(ProjectStatus::InProgress),
            ProjectStatus::InProgress => Some(ProjectStatus::Completed),
            ProjectStatus::Completed => None,
        }
    }

    pub fn previous(self) -> Option<ProjectStatus> {
        match self {
            ProjectStatus::Queue => None,
            ProjectStatus::InProgress => Some(ProjectStatus::Queue),
            ProjectStatus::Completed => Some(ProjectStatus::InProgress),
        }
    }

    pub fn target_of(self, status_move: StatusMove) -> Option<ProjectStatus> {
        match status_move {
            StatusMove::Advance => self.next(),
            StatusMove::Retreat => self.previous(),
        }
    }

    /// Moves offered from this status, in display order (retreat first).
    pub fn available_moves(self) -> Vec<StatusMove> {
        [StatusMove::Retreat, StatusMove::Advance]
            .into_iter()
            .filter(|m| self.target_of(*m).is_some())
            .collect()
    }
}

pub fn check_transition(from: ProjectStatus, to: ProjectStatus) -> TransitionCheck {
    if from == to {
        TransitionCheck::NoOp
    } else if from.next() == Some(to) {
        TransitionCheck::Allowed(StatusMove::Advance)
    } else if from.previous() == Some(to) {
        TransitionCheck::Allowed(StatusMove::Retreat)
    } else {
        TransitionCheck::Forbidden
    }
}
