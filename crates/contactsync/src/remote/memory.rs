//! In-process remote collection backend.
//!
//! This module provides a complete in-memory implementation of
//! [`RemoteCollection`] with the same observable semantics as a cloud
//! document store: server-assigned ids, partial-merge updates, idempotent
//! deletes, and a full-snapshot push to every live listener on each change.
//! It backs the CLI demo and the test suite, including hooks for simulating
//! write and listener failures.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{Error, Result};
use crate::remote::{
    subscription_channel, RawDocument, RemoteCollection, Snapshot, SnapshotSender, Subscription,
};

/// Default per-subscriber buffer of undelivered listener errors.
const DEFAULT_SNAPSHOT_BUFFER: usize = 64;

/// An in-memory document collection with realtime snapshot listeners.
///
/// Safe to share across writers; every mutation from any writer is reflected
/// in a snapshot push to every live subscriber, including the writer's own.
#[derive(Debug)]
pub struct MemoryCollection {
    inner: Mutex<Inner>,
    snapshot_buffer: usize,
}

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<RawDocument>,
    next_id: u64,
    subscribers: Vec<SnapshotSender>,
    fail_next_write: Option<String>,
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_snapshot_buffer(DEFAULT_SNAPSHOT_BUFFER)
    }

    /// Create an empty collection with a custom per-subscriber error buffer.
    /// Snapshot pushes coalesce to the newest and are never buffered.
    #[must_use]
    pub fn with_snapshot_buffer(snapshot_buffer: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            snapshot_buffer,
        }
    }

    /// Get the current number of documents.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.lock().documents.len()
    }

    /// Get the current document set, in storage order.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.lock().documents.clone()
    }

    /// Get the current number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(SnapshotSender::is_live);
        inner.subscribers.len()
    }

    /// Make the next write operation fail with a transport error.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.lock().fail_next_write = Some(message.into());
    }

    /// Push a listener-level error to every live subscriber.
    ///
    /// Simulates a remote failure such as a permission denial or disconnect.
    pub fn inject_listener_error(&self, message: impl Into<String>) {
        let message = message.into();
        let mut inner = self.lock();
        inner
            .subscribers
            .retain(|sub| sub.push_error(Error::subscription(message.clone())));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn take_write_failure(&mut self, operation: &'static str) -> Result<()> {
        match self.fail_next_write.take() {
            Some(message) => Err(Error::remote_write(operation, message)),
            None => Ok(()),
        }
    }

    fn broadcast(&mut self) {
        let snapshot = self.documents.clone();
        self.subscribers
            .retain(|sub| sub.push(snapshot.clone()));
    }
}

#[async_trait::async_trait]
impl RemoteCollection for MemoryCollection {
    async fn create(&self, fields: HashMap<String, String>) -> Result<String> {
        let mut inner = self.lock();
        inner.take_write_failure("create")?;

        inner.next_id += 1;
        let id = format!("doc-{}", inner.next_id);
        inner.documents.push(RawDocument {
            id: id.clone(),
            fields,
        });
        debug!("created document {id}");

        inner.broadcast();
        Ok(id)
    }

    async fn update(&self, id: &str, fields: HashMap<String, String>) -> Result<()> {
        let mut inner = self.lock();
        inner.take_write_failure("update")?;

        let Some(doc) = inner.documents.iter_mut().find(|doc| doc.id == id) else {
            return Err(Error::not_found(id));
        };
        doc.fields.extend(fields);
        debug!("updated document {id}");

        inner.broadcast();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        inner.take_write_failure("delete")?;

        let before = inner.documents.len();
        inner.documents.retain(|doc| doc.id != id);

        // Deleting a missing id is a successful no-op and triggers no push.
        if inner.documents.len() < before {
            debug!("deleted document {id}");
            inner.broadcast();
        }
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        let (tx, subscription) = subscription_channel(self.snapshot_buffer);
        let mut inner = self.lock();

        // Listeners observe the current contents immediately.
        tx.push(inner.documents.clone());
        inner.subscribers.push(tx);

        subscription
    }
}
