//! Contact repository.
//!
//! The sole translation point between typed domain operations and the remote
//! collection: mutations become single remote calls, and the raw snapshot
//! subscription is projected into a stream of [`ContactList`] values.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::contact::{Contact, ContactList, FIELD_NAME, FIELD_NUMBER};
use crate::diagnostics::{CrashReporter, TracingReporter};
use crate::error::{Error, Result};
use crate::remote::{RemoteCollection, Subscription, SubscriptionHandle};

/// Translates contact operations into remote collection calls.
///
/// The remote service handle is injected at construction; the repository
/// holds no ambient or process-wide state. Cloning is cheap and clones share
/// the same remote handle.
#[derive(Clone)]
pub struct ContactRepository {
    remote: Arc<dyn RemoteCollection>,
    reporter: Arc<dyn CrashReporter>,
}

impl std::fmt::Debug for ContactRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactRepository").finish_non_exhaustive()
    }
}

impl ContactRepository {
    /// Create a repository over the given remote collection.
    ///
    /// Listener errors are reported through the tracing subscriber.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteCollection>) -> Self {
        Self::with_reporter(remote, Arc::new(TracingReporter))
    }

    /// Create a repository with an explicit diagnostics sink.
    #[must_use]
    pub fn with_reporter(
        remote: Arc<dyn RemoteCollection>,
        reporter: Arc<dyn CrashReporter>,
    ) -> Self {
        Self { remote, reporter }
    }

    /// Create a new contact at the remote.
    ///
    /// The payload carries only `name` and `number`; the remote service
    /// assigns the id, which becomes visible through the subscription channel
    /// rather than this call's return.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteWrite`] on transport or service failure. No
    /// retry is attempted.
    pub async fn add_contact(&self, name: &str, number: &str) -> Result<()> {
        debug!("adding contact '{name}'");
        self.remote.create(contact_fields(name, number)).await?;
        Ok(())
    }

    /// Overwrite `name` and `number` on an existing contact.
    ///
    /// Partial update: other fields on the remote document are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is empty or no remote document
    /// has it, or [`Error::RemoteWrite`] on transport or service failure.
    pub async fn update_contact(&self, id: &str, name: &str, number: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::not_found(id));
        }
        debug!("updating contact {id}");
        self.remote.update(id, contact_fields(name, number)).await
    }

    /// Delete a contact by id.
    ///
    /// Idempotent at the remote: deleting an id that no longer exists
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is empty, or
    /// [`Error::RemoteWrite`] on transport or service failure.
    pub async fn delete_contact(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::not_found(id));
        }
        debug!("deleting contact {id}");
        self.remote.delete(id).await
    }

    /// Register a live listener on the contact collection.
    ///
    /// The returned stream yields the complete projected contact list on
    /// every remote change by any writer, including this client's own writes.
    /// Listener-level errors are logged and reported, never yielded; the
    /// previous snapshot stays authoritative until a valid one arrives.
    #[must_use]
    pub fn subscribe_contacts(&self) -> ContactStream {
        ContactStream {
            inner: self.remote.subscribe(),
            reporter: Arc::clone(&self.reporter),
        }
    }
}

fn contact_fields(name: &str, number: &str) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    fields.insert(FIELD_NAME.to_string(), name.to_string());
    fields.insert(FIELD_NUMBER.to_string(), number.to_string());
    fields
}

/// A live stream of projected contact lists.
pub struct ContactStream {
    inner: Subscription,
    reporter: Arc<dyn CrashReporter>,
}

impl std::fmt::Debug for ContactStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactStream").finish_non_exhaustive()
    }
}

impl ContactStream {
    /// Receive the next projected contact list.
    ///
    /// Returns `None` once the subscription has been cancelled. Listener
    /// errors do not surface here: they are logged, handed to the diagnostics
    /// sink, and the stream keeps waiting for the next valid snapshot.
    pub async fn next(&mut self) -> Option<ContactList> {
        while let Some(result) = self.inner.recv().await {
            match result {
                Ok(snapshot) => {
                    return Some(snapshot.iter().map(Contact::from_document).collect());
                }
                Err(err) => {
                    warn!("contact listener error: {err}");
                    self.reporter.record_exception(&err);
                }
            }
        }
        None
    }

    /// Get a cloneable handle for cancelling this stream.
    #[must_use]
    pub fn handle(&self) -> SubscriptionHandle {
        self.inner.handle()
    }

    /// Cancel this stream. No lists are delivered after cancellation.
    pub fn cancel(&self) {
        self.inner.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingReporter;
    use crate::remote::memory::MemoryCollection;

    fn repository() -> (Arc<MemoryCollection>, ContactRepository) {
        let collection = Arc::new(MemoryCollection::new());
        let repo = ContactRepository::new(Arc::clone(&collection) as Arc<dyn RemoteCollection>);
        (collection, repo)
    }

    #[tokio::test]
    async fn test_add_contact_sends_name_and_number_only() {
        let (collection, repo) = repository();

        repo.add_contact("Ana", "555-1").await.unwrap();

        let snapshot = collection.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].field("name"), Some("Ana".to_string()));
        assert_eq!(snapshot[0].field("number"), Some("555-1".to_string()));
        assert_eq!(snapshot[0].fields.len(), 2);
        assert!(!snapshot[0].id.is_empty());
    }

    #[tokio::test]
    async fn test_add_then_subscribe_yields_assigned_id() {
        let (_collection, repo) = repository();

        repo.add_contact("Ana", "555-1").await.unwrap();

        let mut stream = repo.subscribe_contacts();
        let contacts = stream.next().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Ana");
        assert_eq!(contacts[0].number, "555-1");
        assert!(contacts[0].is_persisted());
    }

    #[tokio::test]
    async fn test_update_contact_empty_id_is_not_found() {
        let (_collection, repo) = repository();
        let err = repo.update_contact("", "Ana", "555-1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_contact_missing_id_is_not_found() {
        let (_collection, repo) = repository();
        let err = repo
            .update_contact("doc-9", "Ana", "555-1")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_touches_only_target() {
        let (collection, repo) = repository();
        repo.add_contact("Ana", "1").await.unwrap();
        repo.add_contact("Bo", "2").await.unwrap();

        let mut stream = repo.subscribe_contacts();
        let before = stream.next().await.unwrap();
        let ana_id = before.iter().find(|c| c.name == "Ana").unwrap().id.clone();

        repo.update_contact(&ana_id, "Ana", "9").await.unwrap();

        let after = stream.next().await.unwrap();
        let ana = after.iter().find(|c| c.id == ana_id).unwrap();
        assert_eq!(ana.number, "9");

        let bo_before = before.iter().find(|c| c.name == "Bo").unwrap();
        let bo_after = after.iter().find(|c| c.name == "Bo").unwrap();
        assert_eq!(bo_before, bo_after);
        assert_eq!(collection.document_count(), 2);
    }

    #[tokio::test]
    async fn test_delete_contact_empty_id_is_not_found() {
        let (_collection, repo) = repository();
        let err = repo.delete_contact("").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_twice_matches_delete_once() {
        let (collection, repo) = repository();
        repo.add_contact("Ana", "1").await.unwrap();
        let id = collection.snapshot()[0].id.clone();

        repo.delete_contact(&id).await.unwrap();
        repo.delete_contact(&id).await.unwrap();

        assert_eq!(collection.document_count(), 0);
    }

    #[tokio::test]
    async fn test_write_failure_is_remote_write_error() {
        let (collection, repo) = repository();
        collection.fail_next_write("service unavailable");

        let err = repo.add_contact("Ana", "1").await.unwrap_err();
        assert!(err.is_remote_write());
    }

    #[tokio::test]
    async fn test_listener_error_is_swallowed_and_reported() {
        let collection = Arc::new(MemoryCollection::new());
        let reporter = Arc::new(RecordingReporter::new());
        let repo = ContactRepository::with_reporter(
            Arc::clone(&collection) as Arc<dyn RemoteCollection>,
            Arc::clone(&reporter) as Arc<dyn CrashReporter>,
        );

        let mut stream = repo.subscribe_contacts();
        assert!(stream.next().await.unwrap().is_empty());

        collection.inject_listener_error("permission denied");
        repo.add_contact("Ana", "1").await.unwrap();

        // The error never surfaces; the next yielded list is the new snapshot.
        let contacts = stream.next().await.unwrap();
        assert_eq!(contacts.len(), 1);

        let exceptions = reporter.exceptions();
        assert_eq!(exceptions.len(), 1);
        assert!(exceptions[0].contains("permission denied"));
    }

    #[tokio::test]
    async fn test_cancelled_stream_yields_nothing() {
        let (collection, repo) = repository();
        let mut stream = repo.subscribe_contacts();

        stream.cancel();
        collection.create(contact_fields("Ana", "1")).await.unwrap();

        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_projection_defaults_missing_fields() {
        let (collection, repo) = repository();
        collection.create(HashMap::new()).await.unwrap();

        let mut stream = repo.subscribe_contacts();
        let contacts = stream.next().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "");
        assert_eq!(contacts[0].number, "");
        assert!(contacts[0].is_persisted());
    }
}
