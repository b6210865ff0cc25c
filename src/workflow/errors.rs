use thiserror::Error;

use super::state_machine::StatusMove;
use crate::model::ProjectStatus;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The write-through call failed or was rejected; nothing was committed.
    #[error("store write failed: {0}")]
    StoreWrite(#[source] StoreError),

    #[error("could not subscribe to '{collection}': {source}")]
    Subscribe {
        collection: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("project {project_id} cannot move from {from} to {to}")]
    InvalidTransition {
        project_id: String,
        from: ProjectStatus,
        to: ProjectStatus,
    },

    /// Advance from `completed` or retreat from `queue`.
    #[error("project {project_id} cannot {status_move} from {status}")]
    NoFurtherMove {
        project_id: String,
        status: ProjectStatus,
        status_move: StatusMove,
    },

    #[error("project {0} is not on the board")]
    UnknownProject(String),

    #[error("record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("board cache closed")]
    Closed,
}

impl WorkflowError {
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            WorkflowError::StoreWrite(e) => Some(e),
            WorkflowError::Subscribe { source, .. } => Some(source),
            _ => None,
        }
    }
}
