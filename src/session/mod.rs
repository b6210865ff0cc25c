// Identity provider
//
// `SessionManager` is the single owner of the signed-in identity. Anything
// that writes to the board takes a `&Session` explicitly; there is no ambient
// current user.

pub mod accounts;
pub mod slot;

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{Company, User};

pub use accounts::AccountDirectory;
pub use slot::{FileSessionSlot, MemorySessionSlot, SessionSlot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session slot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session slot contents are unreadable: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("no user is signed in")]
    NotSignedIn,
}

/// Identity context handed to every operation that stamps authorship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
}

impl Session {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn company(&self) -> Company {
        self.user.company
    }
}

pub struct SessionManager {
    directory: AccountDirectory,
    slot: Arc<dyn SessionSlot>,
    current: Option<Session>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("current", &self.current)
            .finish()
    }
}

impl SessionManager {
    pub fn new(directory: AccountDirectory, slot: Arc<dyn SessionSlot>) -> Self {
        Self {
            directory,
            slot,
            current: None,
        }
    }

    /// Restore the identity persisted by a previous run. An unreadable slot
    /// is cleared and treated as signed out.
    pub async fn restore(&mut self) -> Result<Option<&Session>, SessionError> {
        self.current = match self.slot.load().await {
            Ok(user) => user.map(Session::new),
            Err(SessionError::Corrupt(e)) => {
                warn!(error = %e, "Discarding unreadable session slot");
                self.slot.clear().await?;
                None
            }
            Err(e) => return Err(e),
        };
        if let Some(session) = &self.current {
            info!(user.id = %session.user_id(), "Restored session");
        }
        Ok(self.current.as_ref())
    }

    /// Returns `false` for bad credentials, leaving any existing session as is.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<bool, SessionError> {
        let user = match self.directory.authenticate(username, password) {
            Ok(user) => user,
            Err(e) => {
                info!(username, reason = %e, "Login rejected");
                return Ok(false);
            }
        };

        self.slot.save(&user).await?;
        info!(user.id = %user.id, company = %user.company, "Signed in");
        self.current = Some(Session::new(user));
        Ok(true)
    }

    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.slot.clear().await?;
        if let Some(session) = self.current.take() {
            info!(user.id = %session.user_id(), "Signed out");
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn require_session(&self) -> Result<&Session, SessionError> {
        self.current.as_ref().ok_or(SessionError::NotSignedIn)
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }
}
