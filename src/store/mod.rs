//! Store adapter: a thin abstraction over a hierarchical key/value store
//! with per-path change notifications.
//!
//! Every state change in the coordination core is a write against this
//! adapter; every reader reacts to the change events it fans out. The only
//! ordering the rest of the crate relies on is per-path: events for a single
//! path are delivered to a subscriber in the order the store accepted the
//! corresponding writes. No cross-path ordering is assumed.

pub mod memory;

use std::error::Error;
use std::fmt;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by store backends regardless of the underlying transport.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not accept or serve the operation.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Human-readable description of the failure.
        message: String,
        /// Underlying transport error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend cancelled a live subscription.
    ///
    /// Cancellation is reported through the subscription's event channel and
    /// never detaches the subscription itself; re-subscribing is the
    /// caller's decision.
    #[error("subscription at `{path}` cancelled: {message}")]
    Cancelled {
        /// Path the subscription was attached to.
        path: String,
        /// Reason reported by the backend.
        message: String,
    },
}

impl StoreError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StoreError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a cancellation notice for the subscription at `path`.
    pub fn cancelled(path: &StorePath, message: impl Into<String>) -> Self {
        StoreError::Cancelled {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

/// A slash-separated path into the hierarchical store.
///
/// Segments are plain keys; the path never encodes hierarchy into composite
/// keys. The empty path addresses the root of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorePath(Vec<String>);

impl StorePath {
    /// The root of the store tree.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from an ordered list of segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Extend this path by one child segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Ordered segments of the path.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `other` addresses this path or a node underneath it.
    pub fn contains(&self, other: &StorePath) -> bool {
        other.0.len() >= self.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| a == b)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Change notification for one child under a `subscribe_children` path.
#[derive(Debug)]
pub enum ChildEvent {
    /// A child appeared. Also delivered once per existing child at attach
    /// time, in key order.
    Added {
        /// Key of the child.
        key: String,
        /// Value of the child subtree.
        value: Value,
    },
    /// An existing child's subtree changed.
    Changed {
        /// Key of the child.
        key: String,
        /// New value of the child subtree.
        value: Value,
    },
    /// A child was removed.
    Removed {
        /// Key of the removed child.
        key: String,
    },
    /// Transport-level failure on this subscription. The subscription stays
    /// attached.
    Fault(StoreError),
}

/// Change notification for a `subscribe_value` path.
#[derive(Debug)]
pub enum ValueEvent {
    /// The value at the path changed; `None` means the node is missing.
    /// Delivered once with the current value at attach time.
    Changed(Option<Value>),
    /// Transport-level failure on this subscription. The subscription stays
    /// attached.
    Fault(StoreError),
}

/// Detaches its subscription when dropped.
///
/// Detachment is scoped: owning the handle keeps the subscription alive, and
/// every exit path that drops the handle releases it.
pub struct SubscriptionHandle {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    /// Wrap a detach action to run exactly once when the handle is dropped.
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach eagerly instead of waiting for drop.
    pub fn detach(self) {}
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

/// Live child-level subscription: the event stream plus its detach handle.
#[derive(Debug)]
pub struct ChildSubscription {
    /// Tagged child events in per-path acceptance order.
    pub events: mpsc::UnboundedReceiver<ChildEvent>,
    /// Drop to detach.
    pub handle: SubscriptionHandle,
}

/// Live value-level subscription: the event stream plus its detach handle.
#[derive(Debug)]
pub struct ValueSubscription {
    /// Tagged value events in per-path acceptance order.
    pub events: mpsc::UnboundedReceiver<ValueEvent>,
    /// Drop to detach.
    pub handle: SubscriptionHandle,
}

/// Abstraction over the hierarchical key/value store used as transport.
pub trait StoreAdapter: Send + Sync {
    /// One-shot read of the subtree at `path`; `None` when missing.
    fn read_once(&self, path: &StorePath) -> BoxFuture<'static, StoreResult<Option<Value>>>;

    /// Whole-subtree replacement at `path`.
    fn write(&self, path: &StorePath, value: Value) -> BoxFuture<'static, StoreResult<()>>;

    /// Child write under `path`; must not disturb siblings.
    fn write_field(
        &self,
        path: &StorePath,
        key: &str,
        value: Value,
    ) -> BoxFuture<'static, StoreResult<()>>;

    /// Remove the subtree at `path`.
    fn delete(&self, path: &StorePath) -> BoxFuture<'static, StoreResult<()>>;

    /// Subscribe to child-level changes under `path`.
    fn subscribe_children(&self, path: &StorePath) -> ChildSubscription;

    /// Subscribe to the value at `path`.
    fn subscribe_value(&self, path: &StorePath) -> ValueSubscription;
}
