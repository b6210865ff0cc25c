// Workflow store adapter
//
// Bridges callers to the realtime store. Writes go straight to the store and
// resolve once acknowledged; the local `Board` only ever changes when the
// store pushes a snapshot back. There is no optimistic update.

use chrono::Utc;
use serde_json::{json, Map};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn, Instrument};

use super::board::{Board, Snapshot};
use super::errors::WorkflowError;
use super::state_machine::{check_transition, StatusMove, TransitionCheck};
use super::subscription::Subscription;
use crate::model::{NewProject, NewUpdate, Project, ProjectStatus, Update};
use crate::session::Session;
use crate::store::{Collection, RealtimeStore, StoreError};
use crate::telemetry::{create_workflow_span, generate_correlation_id};

pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a status change that passed the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Moved {
        from: ProjectStatus,
        to: ProjectStatus,
    },
    /// Target equalled the current status; nothing was written.
    Unchanged { status: ProjectStatus },
}

pub struct WorkflowStore {
    store: Arc<dyn RealtimeStore>,
    board: Arc<watch::Sender<Board>>,
    write_timeout: Duration,
    attachments: Mutex<Vec<Subscription>>,
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore")
            .field("write_timeout", &self.write_timeout)
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl WorkflowStore {
    pub fn new(store: Arc<dyn RealtimeStore>) -> Self {
        let (board, _rx) = watch::channel(Board::default());
        Self {
            store,
            board: Arc::new(board),
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            attachments: Mutex::new(Vec::new()),
        }
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Listen to a collection. `on_change` receives the whole collection now
    /// and after every change until the returned handle is dropped.
    pub async fn subscribe<T, F>(
        &self,
        collection: Collection,
        on_change: F,
    ) -> Result<Subscription, WorkflowError>
    where
        T: crate::model::BoardRecord,
        F: FnMut(Snapshot<T>) + Send + 'static,
    {
        let rx = self
            .store
            .subscribe(collection)
            .await
            .map_err(|source| WorkflowError::Subscribe {
                collection: collection.path(),
                source,
            })?;
        Ok(Subscription::spawn(collection, rx, on_change))
    }

    pub async fn subscribe_projects<F>(&self, on_change: F) -> Result<Subscription, WorkflowError>
    where
        F: FnMut(Snapshot<Project>) + Send + 'static,
    {
        self.subscribe(Collection::Projects, on_change).await
    }

    pub async fn subscribe_updates<F>(&self, on_change: F) -> Result<Subscription, WorkflowError>
    where
        F: FnMut(Snapshot<Update>) + Send + 'static,
    {
        self.subscribe(Collection::Updates, on_change).await
    }

    /// Keep this adapter's own board in step with both collections.
    pub async fn attach(&self) -> Result<(), WorkflowError> {
        if self.is_attached() {
            return Ok(());
        }

        let board = Arc::clone(&self.board);
        let projects = self
            .subscribe_projects(move |snapshot| {
                board.send_modify(|b| b.replace_projects(snapshot));
            })
            .await?;

        let board = Arc::clone(&self.board);
        let updates = self
            .subscribe_updates(move |snapshot| {
                board.send_modify(|b| b.replace_updates(snapshot));
            })
            .await?;

        let mut attachments = self.attachments.lock().unwrap_or_else(PoisonError::into_inner);
        attachments.push(projects);
        attachments.push(updates);
        debug!("Attached board cache to store");
        Ok(())
    }

    /// Drop the board's own subscriptions. The cached board is kept.
    pub fn detach(&self) {
        let drained: Vec<Subscription> = self
            .attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for subscription in drained {
            subscription.unsubscribe();
        }
    }

    pub fn is_attached(&self) -> bool {
        !self
            .attachments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Latest confirmed board.
    pub fn board(&self) -> Board {
        self.board.borrow().clone()
    }

    pub fn loaded(&self) -> bool {
        self.board.borrow().is_loaded()
    }

    /// Receiver that wakes on every board replacement.
    pub fn watch_board(&self) -> watch::Receiver<Board> {
        self.board.subscribe()
    }

    /// Wait until the board satisfies `predicate`.
    pub async fn wait_for<P>(&self, predicate: P) -> Result<Board, WorkflowError>
    where
        P: FnMut(&Board) -> bool,
    {
        let mut rx = self.board.subscribe();
        let board = rx
            .wait_for(predicate)
            .await
            .map_err(|_| WorkflowError::Closed)?;
        Ok(board.clone())
    }

    /// Create a project authored by `session`. Returns the store-generated id.
    pub async fn create_project(
        &self,
        session: &Session,
        input: NewProject,
    ) -> Result<String, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("create_project", None, &correlation_id);

        async {
            let project = Project {
                id: String::new(),
                title: input.title,
                description: input.description,
                status: input.status.unwrap_or_default(),
                created_at: Utc::now().timestamp_millis(),
                created_by: session.user_id().to_string(),
                company: session.company(),
            };
            let value = serde_json::to_value(&project)?;

            let id = self
                .acknowledged(
                    "create_project",
                    self.store.create_record(Collection::Projects, value),
                )
                .await?;
            info!(project.id = %id, status = %project.status, company = %project.company, "Project created");
            Ok(id)
        }
        .instrument(span)
        .await
    }

    /// Post an update against `input.project_id`. The project is not looked up.
    pub async fn create_update(
        &self,
        session: &Session,
        input: NewUpdate,
    ) -> Result<String, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("create_update", Some(input.project_id.as_str()), &correlation_id);

        async {
            let update = Update {
                id: String::new(),
                project_id: input.project_id,
                content: input.content,
                created_at: Utc::now().timestamp_millis(),
                created_by: session.user_id().to_string(),
                company: session.company(),
            };
            let value = serde_json::to_value(&update)?;

            let id = self
                .acknowledged(
                    "create_update",
                    self.store.create_record(Collection::Updates, value),
                )
                .await?;
            info!(update.id = %id, project.id = %update.project_id, "Update posted");
            Ok(id)
        }
        .instrument(span)
        .await
    }

    /// Move a project to `new_status`, enforcing the workflow graph against
    /// the latest confirmed board.
    pub async fn transition_status(
        &self,
        project_id: &str,
        new_status: ProjectStatus,
    ) -> Result<TransitionResult, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("transition_status", Some(project_id), &correlation_id);

        async {
            let current = self.current_status(project_id)?;
            match check_transition(current, new_status) {
                TransitionCheck::NoOp => {
                    debug!(status = %current, "Transition to current status, nothing to write");
                    Ok(TransitionResult::Unchanged { status: current })
                }
                TransitionCheck::Forbidden => {
                    warn!(from = %current, to = %new_status, "Rejected out-of-workflow transition");
                    Err(WorkflowError::InvalidTransition {
                        project_id: project_id.to_string(),
                        from: current,
                        to: new_status,
                    })
                }
                TransitionCheck::Allowed(status_move) => {
                    self.write_status(project_id, new_status).await?;
                    info!(from = %current, to = %new_status, action = %status_move, "Project moved");
                    Ok(TransitionResult::Moved {
                        from: current,
                        to: new_status,
                    })
                }
            }
        }
        .instrument(span)
        .await
    }

    pub async fn advance(&self, project_id: &str) -> Result<TransitionResult, WorkflowError> {
        self.apply_move(project_id, StatusMove::Advance).await
    }

    pub async fn retreat(&self, project_id: &str) -> Result<TransitionResult, WorkflowError> {
        self.apply_move(project_id, StatusMove::Retreat).await
    }

    /// Write `status` without consulting the workflow graph or the board.
    pub async fn force_status(
        &self,
        project_id: &str,
        status: ProjectStatus,
    ) -> Result<(), WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = create_workflow_span("force_status", Some(project_id), &correlation_id);
        async {
            self.write_status(project_id, status).await?;
            warn!(to = %status, "Project status forced");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn apply_move(
        &self,
        project_id: &str,
        status_move: StatusMove,
    ) -> Result<TransitionResult, WorkflowError> {
        let current = self.current_status(project_id)?;
        match current.target_of(status_move) {
            Some(target) => self.transition_status(project_id, target).await,
            None => Err(WorkflowError::NoFurtherMove {
                project_id: project_id.to_string(),
                status: current,
                status_move,
            }),
        }
    }

    fn current_status(&self, project_id: &str) -> Result<ProjectStatus, WorkflowError> {
        self.board
            .borrow()
            .project(project_id)
            .map(|p| p.status)
            .ok_or_else(|| WorkflowError::UnknownProject(project_id.to_string()))
    }

    async fn write_status(&self, project_id: &str, status: ProjectStatus) -> Result<(), WorkflowError> {
        let mut partial = Map::new();
        partial.insert("status".to_string(), json!(status));
        self.acknowledged(
            "transition_status",
            self.store.patch_record(Collection::Projects, project_id, partial),
        )
        .await
    }

    async fn acknowledged<T>(
        &self,
        operation: &str,
        write: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, WorkflowError> {
        match timeout(self.write_timeout, write).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(operation, error = %e, "Store write failed");
                Err(WorkflowError::StoreWrite(e))
            }
            Err(_) => {
                let duration_ms = self.write_timeout.as_millis() as u64;
                warn!(operation, duration_ms, "Store write timed out");
                Err(WorkflowError::StoreWrite(StoreError::Timeout {
                    operation: operation.to_string(),
                    duration_ms,
                }))
            }
        }
    }
}

impl Drop for WorkflowStore {
    fn drop(&mut self) {
        self.detach();
    }
}
