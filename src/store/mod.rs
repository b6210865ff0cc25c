// Realtime document store contract
// The store is the single source of truth: every change is pushed to every
// subscriber as a full collection snapshot.

pub mod errors;
pub mod file;
pub mod ids;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub use errors::StoreError;
pub use file::FileStore;
pub use ids::{IdGenerator, PushIdGenerator, SequentialIds};
pub use memory::{MemoryStore, WriteMode};

/// Complete contents of one collection, keyed by record id. Unordered.
pub type CollectionSnapshot = Arc<Map<String, Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Updates,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Projects, Collection::Updates];

    pub fn path(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Updates => "updates",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Push-on-change document store.
///
/// `subscribe` hands back a watch receiver whose current value is the latest
/// snapshot; the sender side replaces it on every committed write. Writes
/// resolve only once the store has committed them.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Stream of full-collection snapshots, starting with the current one.
    async fn subscribe(
        &self,
        collection: Collection,
    ) -> Result<watch::Receiver<CollectionSnapshot>, StoreError>;

    /// Store `value` under a freshly generated key and return the key.
    async fn create_record(&self, collection: Collection, value: Value)
        -> Result<String, StoreError>;

    /// Merge `partial` into an existing record. Missing records are an error.
    async fn patch_record(
        &self,
        collection: Collection,
        id: &str,
        partial: Map<String, Value>,
    ) -> Result<(), StoreError>;
}

/// Shallow-merge `partial` into the record stored under `id`.
pub(crate) fn merge_into(
    records: &mut Map<String, Value>,
    collection: Collection,
    id: &str,
    partial: Map<String, Value>,
) -> Result<(), StoreError> {
    match records.get_mut(id) {
        Some(Value::Object(record)) => {
            for (key, value) in partial {
                record.insert(key, value);
            }
            Ok(())
        }
        Some(_) => Err(StoreError::Rejected {
            reason: format!("{collection}/{id} is not an object"),
        }),
        None => Err(StoreError::NotFound {
            collection: collection.path(),
            id: id.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_only_touches_given_fields() {
        let mut records = Map::new();
        records.insert(
            "p1".to_string(),
            json!({"title": "Migrate DB", "status": "queue", "createdAt": 5}),
        );

        let mut partial = Map::new();
        partial.insert("status".to_string(), json!("in-progress"));
        merge_into(&mut records, Collection::Projects, "p1", partial).unwrap();

        assert_eq!(
            records["p1"],
            json!({"title": "Migrate DB", "status": "in-progress", "createdAt": 5})
        );
    }

    #[test]
    fn test_merge_missing_record() {
        let mut records = Map::new();
        let err = merge_into(&mut records, Collection::Projects, "nope", Map::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { collection: "projects", .. }));
    }
}
