use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::config::BoardConfig;
use crate::session::{AccountDirectory, FileSessionSlot, SessionManager};
use crate::store::FileStore;
use crate::workflow::{Board, WorkflowStore};

pub mod auth;
pub mod mutate;
pub mod views;
pub mod watch;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: BoardConfig,
}

impl CommandContext {
    pub fn new(config: BoardConfig, store_override: Option<PathBuf>) -> Self {
        let mut config = config;
        if let Some(path) = store_override {
            config.store.path = path;
        }
        Self { config }
    }

    pub async fn sessions(&self) -> Result<SessionManager> {
        let slot = Arc::new(FileSessionSlot::new(&self.config.session.slot_path));
        let mut sessions = SessionManager::new(AccountDirectory::builtin(), slot);
        sessions.restore().await?;
        Ok(sessions)
    }

    /// Open the shared document and wait for the first full board.
    pub async fn board(&self) -> Result<WorkflowStore> {
        let store = FileStore::open(&self.config.store.path, self.config.store.poll_interval())?;
        let workflow =
            WorkflowStore::new(Arc::new(store)).with_write_timeout(self.config.store.write_timeout());
        workflow.attach().await?;
        workflow
            .wait_for(|b: &Board| b.is_loaded() && b.updates_loaded())
            .await?;
        debug!(path = %self.config.store.path.display(), "Board loaded");
        Ok(workflow)
    }
}
