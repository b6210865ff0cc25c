// Partner Board Library - shared project tracking for two partner companies
// This exposes the core components for testing and integration

pub mod cli;
pub mod config;
pub mod model;
pub mod session;
pub mod shutdown;
pub mod store;
pub mod telemetry;
pub mod views;
pub mod workflow;

// Re-export key types for easy access
pub use config::BoardConfig;
pub use model::{Company, NewProject, NewUpdate, Project, ProjectStatus, Update, User, ValidationError};
pub use session::{AccountDirectory, AuthError, Session, SessionError, SessionManager};
pub use shutdown::ShutdownCoordinator;
pub use store::{Collection, FileStore, MemoryStore, RealtimeStore, StoreError};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{Board, StatusMove, Subscription, TransitionResult, WorkflowError, WorkflowStore};
