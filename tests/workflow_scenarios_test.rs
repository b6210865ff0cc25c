// Workflow adapter scenarios against the in-process store
// Every assertion reads the board as pushed back by the store.

use async_trait::async_trait;
use partner_board::model::{Company, NewProject, NewUpdate, ProjectStatus, User};
use partner_board::session::Session;
use partner_board::store::{Collection, CollectionSnapshot, MemoryStore, RealtimeStore, WriteMode};
use partner_board::workflow::{Board, TransitionResult, WorkflowError, WorkflowStore};
use partner_board::StoreError;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Wraps a store and records status patches in the order the store commits them.
struct CommitLog {
    inner: Arc<MemoryStore>,
    statuses: tokio::sync::Mutex<Vec<ProjectStatus>>,
}

#[async_trait]
impl RealtimeStore for CommitLog {
    async fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<watch::Receiver<CollectionSnapshot>, StoreError> {
        self.inner.subscribe(collection).await
    }

    async fn create_record(&self, collection: Collection, value: Value) -> Result<String, StoreError> {
        self.inner.create_record(collection, value).await
    }

    async fn patch_record(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), StoreError> {
        // Held across the commit so log order is commit order.
        let mut statuses = self.statuses.lock().await;
        let status = partial
            .get("status")
            .and_then(|v| serde_json::from_value::<ProjectStatus>(v.clone()).ok());
        self.inner.patch_record(collection, id, partial).await?;
        statuses.extend(status);
        Ok(())
    }
}

fn session(id: &str, company: Company) -> Session {
    Session::new(User {
        id: id.to_string(),
        username: format!("{}_admin", company.as_str()),
        name: format!("{} Admin", company.display_name()),
        company,
    })
}

async fn board_over(store: Arc<dyn RealtimeStore>) -> WorkflowStore {
    let workflow = WorkflowStore::new(store).with_write_timeout(Duration::from_millis(300));
    workflow.attach().await.expect("attach");
    workflow.wait_for(Board::is_loaded).await.expect("loaded");
    workflow
}

#[tokio::test]
async fn test_migrate_db_walkthrough() {
    let store = Arc::new(MemoryStore::with_sequential_ids("p"));
    let workflow = board_over(store.clone()).await;
    let ello = session("1", Company::Ello);

    let id = workflow
        .create_project(&ello, NewProject::new("Migrate DB", "Move to managed Postgres"))
        .await
        .unwrap();
    assert_eq!(id, "p1");

    let board = workflow
        .wait_for(|b| b.project("p1").is_some())
        .await
        .unwrap();
    let created = board.project("p1").unwrap().clone();
    assert_eq!(created.status, ProjectStatus::Queue);
    assert_eq!(board.project_count(), 1);

    let result = workflow
        .transition_status("p1", ProjectStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(
        result,
        TransitionResult::Moved {
            from: ProjectStatus::Queue,
            to: ProjectStatus::InProgress
        }
    );

    let board = workflow
        .wait_for(|b| b.project("p1").map(|p| p.status) == Some(ProjectStatus::InProgress))
        .await
        .unwrap();
    let moved = board.project("p1").unwrap();
    assert_eq!(moved.title, created.title);
    assert_eq!(moved.description, created.description);
    assert_eq!(moved.created_at, created.created_at);
    assert_eq!(moved.created_by, created.created_by);
    assert_eq!(moved.company, created.company);
}

#[tokio::test]
async fn test_transition_to_current_status_writes_nothing() {
    let store = Arc::new(MemoryStore::with_sequential_ids("p"));
    let workflow = board_over(store.clone()).await;
    workflow
        .create_project(&session("1", Company::Ello), NewProject::new("Idle", ""))
        .await
        .unwrap();
    workflow.wait_for(|b| b.project("p1").is_some()).await.unwrap();

    let mut rx = store.subscribe(Collection::Projects).await.unwrap();
    let _ = rx.borrow_and_update();
    let before = store.snapshot(Collection::Projects);
    let result = workflow
        .transition_status("p1", ProjectStatus::Queue)
        .await
        .unwrap();

    assert_eq!(result, TransitionResult::Unchanged { status: ProjectStatus::Queue });
    assert_eq!(store.snapshot(Collection::Projects), before);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn test_updates_are_listed_newest_first() {
    let store = Arc::new(MemoryStore::with_sequential_ids("k"));
    let workflow = board_over(store.clone()).await;
    let stacia = session("2", Company::Stacia);

    let project = workflow
        .create_project(&stacia, NewProject::new("Launch", ""))
        .await
        .unwrap();
    for note in ["kickoff", "design review", "shipped"] {
        workflow
            .create_update(&stacia, NewUpdate::new(&project, note))
            .await
            .unwrap();
        // distinct millisecond timestamps
        tokio::time::sleep(Duration::from_millis(3)).await;
    }

    let board = workflow.wait_for(|b| b.update_count() == 3).await.unwrap();
    let notes: Vec<&str> = board
        .project_updates(&project)
        .iter()
        .map(|u| u.content.as_str())
        .collect();
    assert_eq!(notes, vec!["shipped", "design review", "kickoff"]);
    assert!(board.project_updates(&project).iter().all(|u| u.company == Company::Stacia));
}

#[tokio::test]
async fn test_rejected_write_keeps_subscriptions_alive() {
    let store = Arc::new(MemoryStore::with_sequential_ids("p"));
    let workflow = board_over(store.clone()).await;
    let ello = session("1", Company::Ello);

    store
        .set_write_mode(WriteMode::Reject("permission denied".to_string()))
        .await;
    let err = workflow
        .create_project(&ello, NewProject::new("Nope", ""))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::StoreWrite(StoreError::Rejected { ref reason }) if reason == "permission denied"
    ));
    assert_eq!(workflow.board().project_count(), 0);

    store.set_write_mode(WriteMode::Accept).await;
    let id = workflow
        .create_project(&ello, NewProject::new("Retry", ""))
        .await
        .unwrap();
    workflow.wait_for(|b| b.project(&id).is_some()).await.unwrap();
    assert!(workflow.is_attached());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_moves_last_write_wins() {
    let memory = Arc::new(MemoryStore::with_sequential_ids("p"));
    let log = Arc::new(CommitLog {
        inner: memory.clone(),
        statuses: tokio::sync::Mutex::new(Vec::new()),
    });
    let first = board_over(log.clone()).await;
    let second = board_over(log.clone()).await;

    first
        .create_project(
            &session("1", Company::Ello),
            NewProject::new("Contested", "").with_status(ProjectStatus::InProgress),
        )
        .await
        .unwrap();
    second.wait_for(|b| b.project("p1").is_some()).await.unwrap();

    let (advanced, retreated) = tokio::join!(
        tokio::spawn(async move { first.advance("p1").await }),
        tokio::spawn(async move { second.retreat("p1").await }),
    );
    assert!(advanced.unwrap().is_ok());
    assert!(retreated.unwrap().is_ok());

    let committed = log.statuses.lock().await.clone();
    assert_eq!(committed.len(), 2);
    let final_status: ProjectStatus =
        serde_json::from_value(memory.snapshot(Collection::Projects)["p1"]["status"].clone()).unwrap();
    assert_eq!(Some(&final_status), committed.last());
}

#[tokio::test]
async fn test_unsubscribed_callback_never_runs_again() {
    let store = Arc::new(MemoryStore::with_sequential_ids("p"));
    let workflow = board_over(store.clone()).await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let subscription = workflow
        .subscribe_projects(move |snapshot| sink.lock().unwrap().push(snapshot.len()))
        .await
        .unwrap();
    workflow
        .create_project(&session("1", Company::Ello), NewProject::new("One", ""))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    subscription.unsubscribe();
    let calls_at_unsubscribe = seen.lock().unwrap().len();

    workflow
        .create_project(&session("1", Company::Ello), NewProject::new("Two", ""))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(seen.lock().unwrap().len(), calls_at_unsubscribe);
    assert_eq!(workflow.board().project_count(), 2);
}
