// Snapshot listeners
//
// A subscription is a task draining one watch receiver. Snapshots that arrive
// while a callback is running are coalesced; the latest one is always
// delivered. Once `unsubscribe` returns (or the handle is dropped) the
// callback is not entered again. A callback may drop its own subscription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::board::Snapshot;
use crate::model::BoardRecord;
use crate::store::{Collection, CollectionSnapshot};

#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    collection: Collection,
    open: Arc<AtomicBool>,
    /// Held while the callback runs.
    gate: Arc<Mutex<()>>,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    pub(crate) fn spawn<T, F>(
        collection: Collection,
        mut rx: watch::Receiver<CollectionSnapshot>,
        mut on_change: F,
    ) -> Self
    where
        T: BoardRecord,
        F: FnMut(Snapshot<T>) + Send + 'static,
    {
        let open = Arc::new(AtomicBool::new(true));
        let gate = Arc::new(Mutex::new(()));
        let (task_open, task_gate) = (Arc::clone(&open), Arc::clone(&gate));

        let task = tokio::spawn(async move {
            loop {
                let raw = rx.borrow_and_update().clone();
                let decoded = decode_snapshot::<T>(collection, &raw);
                {
                    let _running = task_gate.lock().unwrap_or_else(PoisonError::into_inner);
                    if !task_open.load(Ordering::Acquire) {
                        break;
                    }
                    debug!(collection = %collection, records = decoded.len(), "Delivering snapshot");
                    on_change(decoded);
                }
                if !task_open.load(Ordering::Acquire) {
                    break;
                }
                if rx.changed().await.is_err() {
                    debug!(collection = %collection, "Store closed the snapshot stream");
                    break;
                }
            }
        });

        Self {
            collection,
            open,
            gate,
            task: Some(task),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn is_active(&self) -> bool {
        self.open.load(Ordering::Acquire) && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.open.store(false, Ordering::Release);

        // From another task, wait out a callback that is already running. From
        // inside the callback the gate is ours already; the loop sees `open`
        // cleared as soon as the callback returns.
        let from_callback = tokio::task::try_id() == Some(task.id());
        if !from_callback {
            drop(self.gate.lock().unwrap_or_else(PoisonError::into_inner));
        }
        task.abort();
        debug!(collection = %self.collection, from_callback, "Unsubscribed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Decode every record in a snapshot, skipping ones that do not parse.
pub fn decode_snapshot<T: BoardRecord>(
    collection: Collection,
    raw: &CollectionSnapshot,
) -> Snapshot<T> {
    raw.iter()
        .filter_map(|(id, value)| match serde_json::from_value::<T>(value.clone()) {
            Ok(mut record) => {
                record.attach_id(id.clone());
                Some((id.clone(), record))
            }
            Err(e) => {
                warn!(collection = %collection, id = %id, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Project;
    use serde_json::{json, Map, Value};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn snapshot(entries: Vec<(&str, Value)>) -> CollectionSnapshot {
        let mut map = Map::new();
        for (id, value) in entries {
            map.insert(id.to_string(), value);
        }
        Arc::new(map)
    }

    fn project_json(title: &str) -> Value {
        json!({
            "title": title,
            "description": "",
            "status": "queue",
            "createdAt": 1,
            "createdBy": "1",
            "company": "ello"
        })
    }

    #[test]
    fn test_decode_skips_bad_records() {
        let raw = snapshot(vec![
            ("p1", project_json("Good")),
            ("p2", json!({"title": "Missing fields"})),
        ]);
        let decoded = decode_snapshot::<Project>(Collection::Projects, &raw);

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded["p1"].id, "p1");
        assert_eq!(decoded["p1"].title, "Good");
    }

    #[tokio::test]
    async fn test_callback_stops_after_unsubscribe() {
        let (tx, mut rx) = watch::channel(snapshot(vec![]));
        rx.mark_changed();
        let calls = Arc::new(Mutex::new(Vec::<usize>::new()));
        let sink = Arc::clone(&calls);

        let subscription = Subscription::spawn::<Project, _>(Collection::Projects, rx, move |snap| {
            sink.lock().unwrap().push(snap.len());
        });

        tx.send(snapshot(vec![("p1", project_json("One"))])).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(subscription.is_active());
        subscription.unsubscribe();

        let _ = tx.send(snapshot(vec![("p1", project_json("One")), ("p2", project_json("Two"))]));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let seen = calls.lock().unwrap().clone();
        assert_eq!(seen.last(), Some(&1));
        assert!(!seen.contains(&2));
    }

    #[tokio::test]
    async fn test_callback_can_unsubscribe_itself() {
        let (tx, mut rx) = watch::channel(snapshot(vec![]));
        rx.mark_changed();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));
        let returned = Arc::new(AtomicBool::new(false));

        let (cb_slot, cb_calls, cb_returned) =
            (Arc::clone(&slot), Arc::clone(&calls), Arc::clone(&returned));
        let subscription = Subscription::spawn::<Project, _>(Collection::Projects, rx, move |_| {
            cb_calls.fetch_add(1, Ordering::SeqCst);
            let own = cb_slot.lock().unwrap().take();
            if let Some(own) = own {
                own.unsubscribe();
                cb_returned.store(true, Ordering::SeqCst);
            }
        });
        *slot.lock().unwrap() = Some(subscription);

        let _ = tx.send(snapshot(vec![("p1", project_json("One"))]));
        tokio::time::timeout(Duration::from_secs(2), async {
            while !returned.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("unsubscribe from inside the callback returned");

        let calls_at_unsubscribe = calls.load(Ordering::SeqCst);
        let _ = tx.send(snapshot(vec![("p2", project_json("Two"))]));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), calls_at_unsubscribe);
        assert!(tx.is_closed());
    }
}
