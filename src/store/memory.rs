// In-process realtime store
//
// Each collection is one watch channel whose value is the committed snapshot.
// Writes mutate the snapshot in place through the sender, which both commits
// the change and wakes every subscriber.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use tracing::debug;

use super::ids::{IdGenerator, PushIdGenerator, SequentialIds};
use super::{merge_into, Collection, CollectionSnapshot, RealtimeStore, StoreError};

/// How the store answers writes. Anything other than `Accept` simulates a
/// misbehaving backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WriteMode {
    #[default]
    Accept,
    /// Reject every write with the given reason.
    Reject(String),
    /// Never acknowledge a write.
    Stall,
}

pub struct MemoryStore {
    channels: HashMap<Collection, watch::Sender<CollectionSnapshot>>,
    ids: Box<dyn IdGenerator>,
    mode: RwLock<WriteMode>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collections", &self.channels.len())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_id_generator(Box::new(PushIdGenerator::new()))
    }

    /// Keys become `prefix1`, `prefix2`, ... across both collections.
    pub fn with_sequential_ids(prefix: &str) -> Self {
        Self::with_id_generator(Box::new(SequentialIds::new(prefix)))
    }

    pub fn with_id_generator(ids: Box<dyn IdGenerator>) -> Self {
        let channels = Collection::ALL
            .iter()
            .map(|collection| {
                let (tx, _rx) = watch::channel(CollectionSnapshot::default());
                (*collection, tx)
            })
            .collect();

        Self {
            channels,
            ids,
            mode: RwLock::new(WriteMode::Accept),
        }
    }

    pub async fn set_write_mode(&self, mode: WriteMode) {
        *self.mode.write().await = mode;
    }

    /// Current committed contents of a collection.
    pub fn snapshot(&self, collection: Collection) -> CollectionSnapshot {
        self.channel(collection).borrow().clone()
    }

    /// Number of live subscribers on a collection.
    pub fn subscriber_count(&self, collection: Collection) -> usize {
        self.channel(collection).receiver_count()
    }

    fn channel(&self, collection: Collection) -> &watch::Sender<CollectionSnapshot> {
        // Every collection gets a channel in the constructor.
        &self.channels[&collection]
    }

    async fn admit_write(&self) -> Result<(), StoreError> {
        let mode = self.mode.read().await.clone();
        match mode {
            WriteMode::Accept => Ok(()),
            WriteMode::Reject(reason) => Err(StoreError::Rejected { reason }),
            WriteMode::Stall => std::future::pending().await,
        }
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<watch::Receiver<CollectionSnapshot>, StoreError> {
        let mut rx = self.channel(collection).subscribe();
        // Deliver the current snapshot as the first change.
        rx.mark_changed();
        Ok(rx)
    }

    async fn create_record(
        &self,
        collection: Collection,
        value: Value,
    ) -> Result<String, StoreError> {
        self.admit_write().await?;

        let id = self.ids.next_id();
        self.channel(collection).send_modify(|snapshot| {
            Arc::make_mut(snapshot).insert(id.clone(), value);
        });
        debug!(collection = %collection, id = %id, "Record created");
        Ok(id)
    }

    async fn patch_record(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.admit_write().await?;

        let mut outcome = Ok(());
        self.channel(collection).send_if_modified(|snapshot| {
            if !snapshot.contains_key(id) {
                outcome = Err(StoreError::NotFound {
                    collection: collection.path(),
                    id: id.to_string(),
                });
                return false;
            }
            outcome = merge_into(Arc::make_mut(snapshot), collection, id, partial);
            outcome.is_ok()
        });
        if outcome.is_ok() {
            debug!(collection = %collection, id = %id, "Record patched");
        }
        outcome
    }
}
