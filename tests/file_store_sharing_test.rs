// Two clients sharing one board document
// Each client owns its own FileStore; changes travel through the file.

use partner_board::model::{Company, NewProject, ProjectStatus, User};
use partner_board::session::Session;
use partner_board::store::FileStore;
use partner_board::workflow::{Board, WorkflowStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn client(path: &Path) -> WorkflowStore {
    let store = FileStore::open(path, Duration::from_millis(20)).unwrap();
    let workflow = WorkflowStore::new(Arc::new(store));
    workflow.attach().await.unwrap();
    workflow.wait_for(Board::is_loaded).await.unwrap();
    workflow
}

fn stacia() -> Session {
    Session::new(User {
        id: "2".to_string(),
        username: "stacia_admin".to_string(),
        name: "Stacia Admin".to_string(),
        company: Company::Stacia,
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_other_client_sees_changes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.json");
    let writer = client(&path).await;
    let reader = client(&path).await;

    let id = writer
        .create_project(&stacia(), NewProject::new("Joint launch", "Q3"))
        .await
        .unwrap();

    let seen = tokio::time::timeout(
        Duration::from_secs(5),
        reader.wait_for(|b| b.project(&id).is_some()),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(seen.project(&id).unwrap().company, Company::Stacia);

    reader.advance(&id).await.unwrap();
    let moved = tokio::time::timeout(
        Duration::from_secs(5),
        writer.wait_for(|b| b.project(&id).map(|p| p.status) == Some(ProjectStatus::InProgress)),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(moved.project(&id).unwrap().title, "Joint launch");
}

#[tokio::test]
async fn test_reopened_store_starts_from_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("board.json");
    let id = {
        let first = client(&path).await;
        first
            .create_project(&stacia(), NewProject::new("Persisted", ""))
            .await
            .unwrap()
    };

    let second = client(&path).await;
    // Loaded from disk before the first callback, no polling needed.
    assert!(second.board().project(&id).is_some());
}
