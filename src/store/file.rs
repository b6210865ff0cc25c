// File-backed realtime store
//
// The whole board is one JSON document. Writers from any process take an
// exclusive fd-lock on a sidecar lock file, re-read the document, apply their
// change and publish it with write-to-temp + rename. Subscribers in this
// process are pushed the new snapshot right after a local commit; changes made
// by other processes are picked up by a poller.

use async_trait::async_trait;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::ids::{IdGenerator, PushIdGenerator};
use super::{merge_into, Collection, CollectionSnapshot, RealtimeStore, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct BoardDocument {
    /// Bumped by every commit; lets readers drop documents older than one
    /// they already published.
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    projects: Map<String, Value>,
    #[serde(default)]
    updates: Map<String, Value>,
}

impl BoardDocument {
    fn records(&self, collection: Collection) -> &Map<String, Value> {
        match collection {
            Collection::Projects => &self.projects,
            Collection::Updates => &self.updates,
        }
    }

    fn records_mut(&mut self, collection: Collection) -> &mut Map<String, Value> {
        match collection {
            Collection::Projects => &mut self.projects,
            Collection::Updates => &mut self.updates,
        }
    }
}

/// Fans committed documents out to local subscribers, newest revision only.
struct Publisher {
    channels: HashMap<Collection, watch::Sender<CollectionSnapshot>>,
    revision: Mutex<u64>,
}

impl Publisher {
    fn new(document: &BoardDocument) -> Self {
        let channels = Collection::ALL
            .iter()
            .map(|collection| {
                let snapshot = Arc::new(document.records(*collection).clone());
                let (tx, _rx) = watch::channel(snapshot);
                (*collection, tx)
            })
            .collect();
        Self {
            channels,
            revision: Mutex::new(document.revision),
        }
    }

    fn subscribe(&self, collection: Collection) -> watch::Receiver<CollectionSnapshot> {
        self.channels[&collection].subscribe()
    }

    /// Returns `false` when `document` is older than what subscribers have seen.
    fn publish(&self, document: &BoardDocument) -> bool {
        // Held across the sends so two publishers cannot interleave.
        let mut published = self.revision.lock().unwrap_or_else(PoisonError::into_inner);
        if document.revision < *published {
            debug!(
                revision = document.revision,
                published = *published,
                "Dropping stale board document"
            );
            return false;
        }
        *published = document.revision;

        for (collection, tx) in self.channels.iter() {
            let records = document.records(*collection);
            tx.send_if_modified(|snapshot| {
                if **snapshot == *records {
                    return false;
                }
                *snapshot = Arc::new(records.clone());
                true
            });
        }
        true
    }
}

pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    poll_interval: Duration,
    ids: Arc<dyn IdGenerator>,
    publisher: Arc<Publisher>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl FileStore {
    /// Open (or start) the board document at `path`.
    pub fn open(path: impl Into<PathBuf>, poll_interval: Duration) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let lock_path = lock_path_for(&path);
        let document = read_document(&path)?;

        let publisher = Arc::new(Publisher::new(&document));

        info!(path = %path.display(), revision = document.revision, "Opened board document");
        Ok(Self {
            path,
            lock_path,
            poll_interval,
            ids: Arc::new(PushIdGenerator::new()),
            publisher,
            poller: Mutex::new(None),
        })
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the document and push any collection that changed.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let document =
            tokio::task::spawn_blocking(move || read_locked(&path, &lock_path)).await??;
        self.publisher.publish(&document);
        Ok(())
    }

    fn ensure_poller(&self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if poller.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let publisher = Arc::clone(&self.publisher);
        let interval = self.poll_interval;
        *poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let (path, lock_path) = (path.clone(), lock_path.clone());
                match tokio::task::spawn_blocking(move || read_locked(&path, &lock_path)).await {
                    Ok(Ok(document)) => {
                        publisher.publish(&document);
                    }
                    Ok(Err(e)) => warn!(error = %e, "Failed to poll board document"),
                    Err(e) => warn!(error = %e, "Board poller worker failed"),
                }
            }
        }));
        debug!(interval_ms = interval.as_millis() as u64, "Started board poller");
    }

    async fn commit<R, F>(&self, mutate: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut BoardDocument) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();
        let (result, document) = tokio::task::spawn_blocking(move || {
            with_exclusive_document(&path, &lock_path, mutate)
        })
        .await??;
        self.publisher.publish(&document);
        Ok(result)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        let poller = self.poller.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = poller.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl RealtimeStore for FileStore {
    async fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<watch::Receiver<CollectionSnapshot>, StoreError> {
        // First delivery must reflect the document, not the empty initial value.
        self.refresh().await?;
        self.ensure_poller();
        let mut rx = self.publisher.subscribe(collection);
        rx.mark_changed();
        Ok(rx)
    }

    async fn create_record(
        &self,
        collection: Collection,
        value: Value,
    ) -> Result<String, StoreError> {
        let id = self.ids.next_id();
        let key = id.clone();
        self.commit(move |document| {
            document.records_mut(collection).insert(key, value);
            Ok(())
        })
        .await?;
        debug!(collection = %collection, id = %id, "Record created");
        Ok(id)
    }

    async fn patch_record(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let key = id.to_string();
        self.commit(move |document| {
            merge_into(document.records_mut(collection), collection, &key, partial)
        })
        .await?;
        debug!(collection = %collection, id = %id, "Record patched");
        Ok(())
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "board.json".into());
    name.push(".lock");
    path.with_file_name(name)
}

fn open_lock_file(lock_path: &Path) -> Result<File, StoreError> {
    Ok(OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?)
}

fn read_document(path: &Path) -> Result<BoardDocument, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BoardDocument::default()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BoardDocument::default()),
        Err(e) => Err(e.into()),
    }
}

fn read_locked(path: &Path, lock_path: &Path) -> Result<BoardDocument, StoreError> {
    let lock = RwLock::new(open_lock_file(lock_path)?);
    let _guard = lock.read().map_err(|e| StoreError::Lock {
        reason: e.to_string(),
    })?;
    read_document(path)
}

fn with_exclusive_document<R>(
    path: &Path,
    lock_path: &Path,
    mutate: impl FnOnce(&mut BoardDocument) -> Result<R, StoreError>,
) -> Result<(R, BoardDocument), StoreError> {
    let mut lock = RwLock::new(open_lock_file(lock_path)?);
    let _guard = lock.write().map_err(|e| StoreError::Lock {
        reason: e.to_string(),
    })?;

    let mut document = read_document(path)?;
    let result = mutate(&mut document)?;
    document.revision += 1;

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, serde_json::to_vec_pretty(&document)?)?;
    std::fs::rename(&tmp_path, path)?;

    Ok((result, document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SequentialIds;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_missing_document_is_empty() {
        let dir = TempDir::new().unwrap();
        let store =
            FileStore::open(dir.path().join("nested/board.json"), Duration::from_secs(1)).unwrap();

        let rx = store.subscribe(Collection::Projects).await.unwrap();
        assert!(rx.borrow().is_empty());
        assert!(dir.path().join("nested").exists());
    }

    #[tokio::test]
    async fn test_writes_are_persisted_as_one_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let store = FileStore::open(&path, Duration::from_secs(1))
            .unwrap()
            .with_id_generator(Arc::new(SequentialIds::new("p")));

        store
            .create_record(Collection::Projects, json!({"title": "Migrate DB", "status": "queue"}))
            .await
            .unwrap();
        let mut partial = Map::new();
        partial.insert("status".to_string(), json!("in-progress"));
        store.patch_record(Collection::Projects, "p1", partial).await.unwrap();

        let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            on_disk,
            json!({
                "revision": 2,
                "projects": {"p1": {"title": "Migrate DB", "status": "in-progress"}},
                "updates": {}
            })
        );
    }

    #[tokio::test]
    async fn test_local_commit_pushes_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("board.json"), Duration::from_secs(60))
            .unwrap()
            .with_id_generator(Arc::new(SequentialIds::new("u")));
        let mut rx = store.subscribe(Collection::Updates).await.unwrap();
        let _ = rx.borrow_and_update();

        store
            .create_record(Collection::Updates, json!({"content": "kickoff"}))
            .await
            .unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow()["u1"]["content"], json!("kickoff"));
    }

    #[tokio::test]
    async fn test_refresh_sees_other_writers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let reader = FileStore::open(&path, Duration::from_secs(60)).unwrap();
        let writer = FileStore::open(&path, Duration::from_secs(60))
            .unwrap()
            .with_id_generator(Arc::new(SequentialIds::new("p")));
        let mut rx = reader.subscribe(Collection::Projects).await.unwrap();
        let _ = rx.borrow_and_update();

        writer
            .create_record(Collection::Projects, json!({"title": "From elsewhere"}))
            .await
            .unwrap();
        reader.refresh().await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update()["p1"]["title"], json!("From elsewhere"));
    }

    #[tokio::test]
    async fn test_patch_missing_record_leaves_document_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let store = FileStore::open(&path, Duration::from_secs(60)).unwrap();

        let err = store
            .patch_record(Collection::Projects, "ghost", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_older_document_is_never_published() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("board.json");
        let store = FileStore::open(&path, Duration::from_secs(60))
            .unwrap()
            .with_id_generator(Arc::new(SequentialIds::new("p")));
        let mut rx = store.subscribe(Collection::Projects).await.unwrap();

        store
            .create_record(Collection::Projects, json!({"title": "First"}))
            .await
            .unwrap();
        // A poll that read the file before this commit landed.
        let stale = read_document(&path).unwrap();
        store
            .create_record(Collection::Projects, json!({"title": "Second"}))
            .await
            .unwrap();
        let _ = rx.borrow_and_update();

        assert_eq!(stale.revision, 1);
        assert!(!store.publisher.publish(&stale));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(rx.borrow().len(), 2);

        // Same-revision re-reads still go through.
        store.refresh().await.unwrap();
        assert_eq!(rx.borrow().len(), 2);
    }

    #[test]
    fn test_lock_path_is_a_sidecar() {
        assert_eq!(
            lock_path_for(Path::new("/tmp/x/board.json")),
            PathBuf::from("/tmp/x/board.json.lock")
        );
    }
}
