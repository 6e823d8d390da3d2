//! In-memory store backend.
//!
//! A single mutex-guarded JSON tree plus a registry of live subscribers.
//! Every mutation diffs the affected paths and fans events out while the
//! tree lock is held, which is what gives subscribers the per-path
//! acceptance-order guarantee the coordination core relies on. Child maps
//! are `serde_json` objects, so children always iterate in lexicographic
//! key order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::trace;

use super::{
    ChildEvent, ChildSubscription, StoreAdapter, StoreError, StorePath, StoreResult,
    SubscriptionHandle, ValueEvent, ValueSubscription,
};

/// Hierarchical key/value store held entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    tree: Mutex<Value>,
    child_subs: DashMap<u64, ChildSubscriber>,
    value_subs: DashMap<u64, ValueSubscriber>,
    next_id: AtomicU64,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            tree: Mutex::new(Value::Object(Map::new())),
            child_subs: DashMap::new(),
            value_subs: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }
}

struct ChildSubscriber {
    path: StorePath,
    tx: mpsc::UnboundedSender<ChildEvent>,
}

struct ValueSubscriber {
    path: StorePath,
    tx: mpsc::UnboundedSender<ValueEvent>,
    last: Mutex<Option<Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a cancellation fault to every subscription attached exactly
    /// at `path`, without detaching any of them.
    ///
    /// Models the backend-initiated listener cancellation real transports
    /// exhibit; used to exercise the fault path.
    pub fn cancel_subscriptions(&self, path: &StorePath, message: &str) {
        for entry in self.inner.child_subs.iter() {
            if entry.path == *path {
                let _ = entry
                    .tx
                    .send(ChildEvent::Fault(StoreError::cancelled(path, message)));
            }
        }
        for entry in self.inner.value_subs.iter() {
            if entry.path == *path {
                let _ = entry
                    .tx
                    .send(ValueEvent::Fault(StoreError::cancelled(path, message)));
            }
        }
    }
}

impl StoreAdapter for MemoryStore {
    fn read_once(&self, path: &StorePath) -> BoxFuture<'static, StoreResult<Option<Value>>> {
        let inner = self.inner.clone();
        let path = path.clone();
        async move {
            let tree = lock(&inner.tree);
            Ok(value_at(&tree, &path).cloned())
        }
        .boxed()
    }

    fn write(&self, path: &StorePath, value: Value) -> BoxFuture<'static, StoreResult<()>> {
        let inner = self.inner.clone();
        let path = path.clone();
        async move {
            trace!(%path, "store write");
            inner.mutate(&path, Some(value));
            Ok(())
        }
        .boxed()
    }

    fn write_field(
        &self,
        path: &StorePath,
        key: &str,
        value: Value,
    ) -> BoxFuture<'static, StoreResult<()>> {
        let inner = self.inner.clone();
        let path = path.child(key);
        async move {
            trace!(%path, "store field write");
            inner.mutate(&path, Some(value));
            Ok(())
        }
        .boxed()
    }

    fn delete(&self, path: &StorePath) -> BoxFuture<'static, StoreResult<()>> {
        let inner = self.inner.clone();
        let path = path.clone();
        async move {
            trace!(%path, "store delete");
            inner.mutate(&path, None);
            Ok(())
        }
        .boxed()
    }

    fn subscribe_children(&self, path: &StorePath) -> ChildSubscription {
        let (tx, events) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            // Replay existing children and register atomically with respect
            // to writes, so no event is missed or duplicated.
            let tree = lock(&self.inner.tree);
            for (key, value) in children_at(&tree, path) {
                let _ = tx.send(ChildEvent::Added { key, value });
            }
            self.inner.child_subs.insert(
                id,
                ChildSubscriber {
                    path: path.clone(),
                    tx,
                },
            );
        }
        let registry = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.child_subs.remove(&id);
            }
        });
        ChildSubscription { events, handle }
    }

    fn subscribe_value(&self, path: &StorePath) -> ValueSubscription {
        let (tx, events) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let tree = lock(&self.inner.tree);
            let current = value_at(&tree, path).cloned();
            let _ = tx.send(ValueEvent::Changed(current.clone()));
            self.inner.value_subs.insert(
                id,
                ValueSubscriber {
                    path: path.clone(),
                    tx,
                    last: Mutex::new(current),
                },
            );
        }
        let registry = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.value_subs.remove(&id);
            }
        });
        ValueSubscription { events, handle }
    }
}

impl Inner {
    /// Apply a mutation (`Some` = whole-subtree replacement, `None` =
    /// delete) and notify every subscriber whose path is affected. All
    /// notification happens under the tree lock, in key order per
    /// subscriber, which yields per-path acceptance ordering.
    fn mutate(&self, target: &StorePath, new_value: Option<Value>) {
        let mut tree = lock(&self.tree);

        let child_pre: Vec<(u64, StorePath, Map<String, Value>)> = self
            .child_subs
            .iter()
            .filter(|entry| overlaps(&entry.path, target))
            .map(|entry| (*entry.key(), entry.path.clone(), children_at(&tree, &entry.path)))
            .collect();

        match new_value {
            Some(value) => set_at(&mut tree, target, value),
            None => {
                delete_at(&mut tree, target);
            }
        }

        for (id, path, pre) in child_pre {
            let post = children_at(&tree, &path);
            if let Some(sub) = self.child_subs.get(&id) {
                diff_children(&pre, &post, |event| {
                    let _ = sub.tx.send(event);
                });
            }
        }

        for entry in self.value_subs.iter() {
            if !overlaps(&entry.path, target) {
                continue;
            }
            let post = value_at(&tree, &entry.path).cloned();
            let mut last = lock(&entry.last);
            if *last != post {
                *last = post.clone();
                let _ = entry.tx.send(ValueEvent::Changed(post));
            }
        }
    }
}

/// Whether a mutation at `target` can change what a subscriber at `sub`
/// observes.
fn overlaps(sub: &StorePath, target: &StorePath) -> bool {
    sub.contains(target) || target.contains(sub)
}

/// Poison-tolerant lock: the tree stays usable even if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn value_at<'a>(tree: &'a Value, path: &StorePath) -> Option<&'a Value> {
    let mut node = tree;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

fn children_at(tree: &Value, path: &StorePath) -> Map<String, Value> {
    value_at(tree, path)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Coerce a node into an object map, replacing any scalar in the way.
fn as_map(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just coerced to an object"),
    }
}

fn set_at(tree: &mut Value, path: &StorePath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        *tree = value;
        return;
    };
    let mut node = tree;
    for segment in parents {
        node = as_map(node)
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    as_map(node).insert(last.clone(), value);
}

/// Remove the subtree at `path`, pruning parents left empty: the store has
/// no notion of an empty node, matching the transport it models.
fn delete_at(tree: &mut Value, path: &StorePath) -> bool {
    fn recurse(node: &mut Value, segments: &[String]) -> bool {
        let Value::Object(map) = node else {
            return false;
        };
        let Some((first, rest)) = segments.split_first() else {
            return false;
        };
        if rest.is_empty() {
            return map.remove(first).is_some();
        }
        let Some(child) = map.get_mut(first) else {
            return false;
        };
        let removed = recurse(child, rest);
        if removed && child.as_object().is_some_and(Map::is_empty) {
            map.remove(first);
        }
        removed
    }

    if path.segments().is_empty() {
        *tree = Value::Object(Map::new());
        return true;
    }
    recurse(tree, path.segments())
}

/// Emit child events for the transition `pre` → `post`, additions and
/// changes first, removals after, each group in key order.
fn diff_children(
    pre: &Map<String, Value>,
    post: &Map<String, Value>,
    mut send: impl FnMut(ChildEvent),
) {
    for (key, value) in post {
        match pre.get(key) {
            None => send(ChildEvent::Added {
                key: key.clone(),
                value: value.clone(),
            }),
            Some(old) if old != value => send(ChildEvent::Changed {
                key: key.clone(),
                value: value.clone(),
            }),
            Some(_) => {}
        }
    }
    for key in pre.keys() {
        if !post.contains_key(key) {
            send(ChildEvent::Removed { key: key.clone() });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(raw: &str) -> StorePath {
        StorePath::new(raw.split('/'))
    }

    async fn read(store: &MemoryStore, raw: &str) -> Option<Value> {
        store.read_once(&path(raw)).await.expect("read")
    }

    #[tokio::test]
    async fn write_then_read_roundtrip() {
        let store = MemoryStore::new();
        store
            .write(&path("rooms/AB12CD"), json!({"status": "waiting"}))
            .await
            .expect("write");
        assert_eq!(
            read(&store, "rooms/AB12CD/status").await,
            Some(json!("waiting"))
        );
        assert_eq!(read(&store, "rooms/ZZZZZZ").await, None);
    }

    #[tokio::test]
    async fn write_field_preserves_siblings() {
        let store = MemoryStore::new();
        store
            .write(&path("rooms/R"), json!({"status": "waiting", "hostId": "u1"}))
            .await
            .expect("write");
        store
            .write_field(&path("rooms/R"), "status", json!("swiping"))
            .await
            .expect("write_field");
        assert_eq!(read(&store, "rooms/R/hostId").await, Some(json!("u1")));
        assert_eq!(read(&store, "rooms/R/status").await, Some(json!("swiping")));
    }

    #[tokio::test]
    async fn delete_prunes_empty_parents() {
        let store = MemoryStore::new();
        store
            .write(&path("rooms/R/members/u1"), json!({"host": true}))
            .await
            .expect("write");
        store
            .delete(&path("rooms/R/members/u1"))
            .await
            .expect("delete");
        assert_eq!(read(&store, "rooms/R").await, None);
    }

    #[tokio::test]
    async fn children_subscription_replays_then_streams() {
        let store = MemoryStore::new();
        store
            .write(&path("rooms/R/members/b"), json!({"joinedAt": 2}))
            .await
            .expect("write");
        store
            .write(&path("rooms/R/members/a"), json!({"joinedAt": 1}))
            .await
            .expect("write");

        let mut sub = store.subscribe_children(&path("rooms/R/members"));

        // Replay is in lexicographic key order.
        match sub.events.try_recv().expect("replay a") {
            ChildEvent::Added { key, .. } => assert_eq!(key, "a"),
            other => panic!("expected added, got {other:?}"),
        }
        match sub.events.try_recv().expect("replay b") {
            ChildEvent::Added { key, .. } => assert_eq!(key, "b"),
            other => panic!("expected added, got {other:?}"),
        }

        store
            .write(&path("rooms/R/members/c"), json!({"joinedAt": 3}))
            .await
            .expect("write");
        match sub.events.try_recv().expect("incremental add") {
            ChildEvent::Added { key, .. } => assert_eq!(key, "c"),
            other => panic!("expected added, got {other:?}"),
        }

        store
            .write_field(&path("rooms/R/members/a"), "host", json!(true))
            .await
            .expect("write_field");
        match sub.events.try_recv().expect("change") {
            ChildEvent::Changed { key, value } => {
                assert_eq!(key, "a");
                assert_eq!(value["host"], json!(true));
            }
            other => panic!("expected changed, got {other:?}"),
        }

        store
            .delete(&path("rooms/R/members/b"))
            .await
            .expect("delete");
        match sub.events.try_recv().expect("removal") {
            ChildEvent::Removed { key } => assert_eq!(key, "b"),
            other => panic!("expected removed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn value_subscription_delivers_current_then_distinct_values() {
        let store = MemoryStore::new();
        let status = path("rooms/R/status");
        let mut sub = store.subscribe_value(&status);

        match sub.events.try_recv().expect("initial") {
            ValueEvent::Changed(value) => assert_eq!(value, None),
            other => panic!("expected changed, got {other:?}"),
        }

        store.write(&status, json!("waiting")).await.expect("write");
        // Rewriting the same value is not a new observation.
        store.write(&status, json!("waiting")).await.expect("write");
        store.write(&status, json!("swiping")).await.expect("write");

        match sub.events.try_recv().expect("first value") {
            ValueEvent::Changed(value) => assert_eq!(value, Some(json!("waiting"))),
            other => panic!("expected changed, got {other:?}"),
        }
        match sub.events.try_recv().expect("second value") {
            ValueEvent::Changed(value) => assert_eq!(value, Some(json!("swiping"))),
            other => panic!("expected changed, got {other:?}"),
        }
        assert!(sub.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_arrive_in_write_acceptance_order() {
        let store = MemoryStore::new();
        let page = path("rooms/R/currentPage");
        let mut sub = store.subscribe_value(&page);
        let _ = sub.events.try_recv();

        for value in [7, 8, 0, 9] {
            store.write(&page, json!(value)).await.expect("write");
        }
        for expected in [7, 8, 0, 9] {
            match sub.events.try_recv().expect("ordered value") {
                ValueEvent::Changed(value) => assert_eq!(value, Some(json!(expected))),
                other => panic!("expected changed, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn dropping_handle_detaches() {
        let store = MemoryStore::new();
        let members = path("rooms/R/members");
        let mut sub = store.subscribe_children(&members);
        drop(sub.handle);

        store
            .write(&path("rooms/R/members/u1"), json!({"joinedAt": 1}))
            .await
            .expect("write");
        // Sender side is gone, so the stream ends instead of delivering.
        assert!(sub.events.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_faults_without_detaching() {
        let store = MemoryStore::new();
        let status = path("rooms/R/status");
        let mut sub = store.subscribe_value(&status);
        let _ = sub.events.try_recv();

        store.cancel_subscriptions(&status, "backend restart");
        match sub.events.try_recv().expect("fault") {
            ValueEvent::Fault(StoreError::Cancelled { path, .. }) => {
                assert_eq!(path, "rooms/R/status");
            }
            other => panic!("expected fault, got {other:?}"),
        }

        // Still attached: the next write is observed.
        store.write(&status, json!("waiting")).await.expect("write");
        match sub.events.try_recv().expect("post-fault value") {
            ValueEvent::Changed(value) => assert_eq!(value, Some(json!("waiting"))),
            other => panic!("expected changed, got {other:?}"),
        }
    }
}
