// Workflow layer: the board cache, status rules and the store adapter

pub mod adapter;
pub mod board;
pub mod errors;
pub mod state_machine;
pub mod subscription;

pub use adapter::{TransitionResult, WorkflowStore, DEFAULT_WRITE_TIMEOUT};
pub use board::{Board, Snapshot, StatusCounts, StatusPartition};
pub use errors::WorkflowError;
pub use state_machine::{check_transition, StatusMove, TransitionCheck};
pub use subscription::{decode_snapshot, Subscription};
