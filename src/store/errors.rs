use thiserror::Error;

/// Failures surfaced by a store backend. A write that returns any of these was
/// not committed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write rejected by store: {reason}")]
    Rejected { reason: String },

    #[error("record {collection}/{id} does not exist")]
    NotFound { collection: &'static str, id: String },

    #[error("store operation '{operation}' timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("could not lock store document: {reason}")]
    Lock { reason: String },

    #[error("store worker failed: {reason}")]
    Worker { reason: String },
}

impl StoreError {
    /// Whether the caller may reasonably try the same write again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Timeout { .. } | StoreError::Io(_) | StoreError::Lock { .. }
        )
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Worker {
            reason: err.to_string(),
        }
    }
}
