//! Remote collection abstraction.
//!
//! This module defines the interface to the opaque remote document store:
//! raw documents, the [`RemoteCollection`] trait that backends implement, and
//! the cancellable snapshot subscription consumed by the repository layer.

pub mod memory;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::warn;

use crate::error::{Error, Result};

/// A schema-flexible document as stored in the remote collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    /// Server-assigned document id.
    pub id: String,

    /// Document field keys and values.
    pub fields: HashMap<String, String>,
}

impl RawDocument {
    /// Get a field value by key, if present.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<String> {
        self.fields.get(key).cloned()
    }
}

/// The full current document set, delivered to a live listener whenever any
/// document in the collection changes.
pub type Snapshot = Vec<RawDocument>;

/// A remote document store holding a single flat collection.
///
/// Backends are injected into the repository explicitly; there is no ambient
/// client singleton. Every operation performs exactly one remote call.
#[async_trait::async_trait]
pub trait RemoteCollection: Send + Sync {
    /// Create a new document with the given fields.
    ///
    /// Returns the server-assigned id. Callers that rely on the subscription
    /// channel for visibility are free to discard it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteWrite`] on transport or service failure.
    async fn create(&self, fields: HashMap<String, String>) -> Result<String>;

    /// Overwrite the given fields on an existing document.
    ///
    /// This is a partial update: fields not named in `fields` are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no document has the given id, or
    /// [`Error::RemoteWrite`] on transport or service failure.
    async fn update(&self, id: &str, fields: HashMap<String, String>) -> Result<()>;

    /// Delete a document by id.
    ///
    /// Idempotent: deleting a non-existent id succeeds (document-store delete
    /// semantics).
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteWrite`] on transport or service failure.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Register a live listener on the whole collection.
    ///
    /// The returned subscription yields the full current snapshot on every
    /// remote change, by any writer, until it is cancelled. Backends deliver
    /// the current snapshot immediately upon subscribing.
    fn subscribe(&self) -> Subscription;
}

/// A cloneable cancel signal for a live subscription.
///
/// Cancellation is explicit: once [`cancel`](Self::cancel) is called, the
/// paired [`Subscription`] yields no further snapshots, deterministically,
/// even if a remote change races with the cancellation.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    cancel: Arc<watch::Sender<bool>>,
}

impl SubscriptionHandle {
    /// Signal the subscription to stop.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Check if the subscription has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }
}

/// A live stream of full-collection snapshot pushes.
///
/// Every push carries the full document set, so undelivered pushes coalesce:
/// a subscriber that falls behind skips intermediate snapshots and always
/// observes the newest one. Consumed via [`recv`](Self::recv); disposed via
/// [`cancel`](Self::cancel) or any clone of its [`SubscriptionHandle`].
#[derive(Debug)]
pub struct Subscription {
    snapshots: watch::Receiver<Snapshot>,
    errors: mpsc::Receiver<Error>,
    errors_open: bool,
    cancel_rx: watch::Receiver<bool>,
    handle: SubscriptionHandle,
}

impl Subscription {
    /// Receive the next unseen snapshot, or a listener error.
    ///
    /// Errors pushed before a snapshot are delivered before it. Returns
    /// `None` once the subscription has been cancelled or the backend has
    /// gone away. A push that races with cancellation is discarded, never
    /// delivered.
    pub async fn recv(&mut self) -> Option<Result<Snapshot>> {
        loop {
            if self.handle.is_cancelled() {
                return None;
            }
            tokio::select! {
                biased;
                _ = self.cancel_rx.changed() => return None,
                err = self.errors.recv(), if self.errors_open => match err {
                    Some(error) if !self.handle.is_cancelled() => {
                        return Some(Err(error));
                    }
                    Some(_) => return None,
                    // Backend gone; any final unseen snapshot still drains
                    // through the branch below.
                    None => self.errors_open = false,
                },
                changed = self.snapshots.changed() => return match changed {
                    Ok(()) if !self.handle.is_cancelled() => {
                        Some(Ok(self.snapshots.borrow_and_update().clone()))
                    }
                    _ => None,
                },
            }
        }
    }

    /// Get a cloneable handle for cancelling this subscription.
    #[must_use]
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    /// Cancel this subscription.
    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

/// The backend side of a subscription: pushes snapshots (or listener errors)
/// toward the consumer.
#[derive(Debug, Clone)]
pub struct SnapshotSender {
    snapshots: Arc<watch::Sender<Snapshot>>,
    errors: mpsc::Sender<Error>,
    cancel_rx: watch::Receiver<bool>,
}

impl SnapshotSender {
    /// Push a snapshot to the subscriber.
    ///
    /// A push to a lagging subscriber replaces any undelivered snapshot, so
    /// the latest document set is always the one delivered. Returns `false`
    /// if the subscriber is gone (cancelled or dropped) and should be pruned.
    pub fn push(&self, snapshot: Snapshot) -> bool {
        if !self.is_live() {
            return false;
        }
        self.snapshots.send_replace(snapshot);
        true
    }

    /// Push a listener-level error to the subscriber.
    ///
    /// Returns `false` if the subscriber is gone.
    pub fn push_error(&self, error: Error) -> bool {
        if !self.is_live() {
            return false;
        }
        match self.errors.try_send(error) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                // Listener errors are advisory; the snapshots keep flowing.
                warn!("listener error buffer full, dropping error");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Check if the paired subscription can still receive pushes.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !*self.cancel_rx.borrow() && !self.snapshots.is_closed()
    }
}

/// Create a paired snapshot sender and subscription.
///
/// Undelivered snapshots coalesce to the newest one, so they never queue up
/// behind a slow consumer. `capacity` bounds buffered listener errors; a
/// capacity of zero is treated as one.
#[must_use]
pub fn subscription_channel(capacity: usize) -> (SnapshotSender, Subscription) {
    let (snapshots_tx, snapshots_rx) = watch::channel(Snapshot::new());
    let (errors_tx, errors_rx) = mpsc::channel(capacity.max(1));
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let handle = SubscriptionHandle {
        cancel: Arc::new(cancel_tx),
    };
    (
        SnapshotSender {
            snapshots: Arc::new(snapshots_tx),
            errors: errors_tx,
            cancel_rx: cancel_rx.clone(),
        },
        Subscription {
            snapshots: snapshots_rx,
            errors: errors_rx,
            errors_open: true,
            cancel_rx,
            handle,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> RawDocument {
        RawDocument {
            id: id.to_string(),
            fields: HashMap::new(),
        }
    }

    #[test]
    fn test_raw_document_field() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), "Ana".to_string());
        let doc = RawDocument {
            id: "x1".to_string(),
            fields,
        };

        assert_eq!(doc.field("name"), Some("Ana".to_string()));
        assert_eq!(doc.field("number"), None);
    }

    #[tokio::test]
    async fn test_push_then_recv() {
        let (tx, mut sub) = subscription_channel(8);

        assert!(tx.push(vec![doc("x1")]));

        let snapshot = sub.recv().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "x1");
    }

    #[tokio::test]
    async fn test_recv_after_cancel_returns_none() {
        let (tx, mut sub) = subscription_channel(8);

        sub.cancel();
        assert!(sub.recv().await.is_none());

        // A push racing the cancellation is never delivered.
        tx.push(vec![doc("x1")]);
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_buffered_push_discarded_after_cancel() {
        let (tx, mut sub) = subscription_channel(8);

        // Push lands in the buffer before the consumer cancels.
        assert!(tx.push(vec![doc("x1")]));
        sub.cancel();

        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_wakes_pending_recv() {
        let (_tx, mut sub) = subscription_channel(8);
        let handle = sub.handle();

        let waiter = tokio::spawn(async move { sub.recv().await });
        tokio::task::yield_now().await;
        handle.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("recv did not wake on cancel")
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_push_error_delivered() {
        let (tx, mut sub) = subscription_channel(8);

        assert!(tx.push_error(Error::subscription("permission denied")));

        let item = sub.recv().await.unwrap();
        assert!(item.unwrap_err().is_subscription());
    }

    #[tokio::test]
    async fn test_sender_not_live_after_cancel() {
        let (tx, sub) = subscription_channel(8);
        assert!(tx.is_live());

        sub.cancel();
        assert!(!tx.is_live());
        assert!(!tx.push(vec![doc("x1")]));
    }

    #[tokio::test]
    async fn test_sender_not_live_after_drop() {
        let (tx, sub) = subscription_channel(8);
        drop(sub);
        assert!(!tx.is_live());
    }

    #[tokio::test]
    async fn test_lagging_subscriber_settles_on_latest_snapshot() {
        let (tx, mut sub) = subscription_channel(1);

        // The second push lands before the subscriber drains the first; the
        // final document set must still be the one delivered.
        assert!(tx.push(vec![doc("x1")]));
        assert!(tx.push(vec![doc("x1"), doc("x2")]));

        let latest = sub.recv().await.unwrap().unwrap();
        assert_eq!(latest.len(), 2);
        assert!(tx.is_live());
    }

    #[tokio::test]
    async fn test_coalesced_pushes_skip_intermediate_snapshots() {
        let (tx, mut sub) = subscription_channel(1);

        assert!(tx.push(vec![doc("x1")]));
        assert_eq!(sub.recv().await.unwrap().unwrap().len(), 1);

        assert!(tx.push(vec![doc("x1"), doc("x2")]));
        assert!(tx.push(vec![doc("x1"), doc("x2"), doc("x3")]));

        // One recv, newest snapshot; the intermediate one is superseded.
        let latest = sub.recv().await.unwrap().unwrap();
        assert_eq!(latest.len(), 3);
    }

    #[tokio::test]
    async fn test_handle_clone_shares_signal() {
        let (_tx, sub) = subscription_channel(8);
        let handle1 = sub.handle();
        let handle2 = handle1.clone();

        assert!(!handle2.is_cancelled());
        handle1.cancel();
        assert!(handle2.is_cancelled());
    }
}
