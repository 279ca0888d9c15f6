//! Contact state holder.
//!
//! [`ContactStore`] is the single source of truth for UI-observable contact
//! state. It starts exactly one live subscription at construction and
//! replaces its list wholesale with every snapshot push. Mutations are
//! fire-and-forget: they are queued to a bounded background worker and the
//! caller returns immediately; effects become visible through the next push,
//! not through the mutation's own completion.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::contact::ContactList;
use crate::error::Error;
use crate::remote::SubscriptionHandle;
use crate::repository::ContactRepository;

/// A queued contact mutation.
#[derive(Debug)]
enum Mutation {
    Add { name: String, number: String },
    Update { id: String, name: String, number: String },
    Delete { id: String },
}

impl Mutation {
    fn operation(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add_contact",
            Self::Update { .. } => "update_contact",
            Self::Delete { .. } => "delete_contact",
        }
    }
}

/// Observable holder of the current contact list.
///
/// Must be created inside a Tokio runtime; construction spawns the sync task
/// and the mutation worker. The list is written only by the sync task;
/// everything else reads.
#[derive(Debug)]
pub struct ContactStore {
    contacts: watch::Receiver<ContactList>,
    mutations: mpsc::Sender<Mutation>,
    errors_tx: mpsc::Sender<Error>,
    errors_rx: Mutex<Option<mpsc::Receiver<Error>>>,
    subscription: SubscriptionHandle,
}

impl ContactStore {
    /// Create a store over the given repository with default queue sizes.
    #[must_use]
    pub fn new(repository: ContactRepository) -> Self {
        Self::with_config(repository, &SyncConfig::default())
    }

    /// Create a store with explicit queue capacities.
    #[must_use]
    pub fn with_config(repository: ContactRepository, config: &SyncConfig) -> Self {
        let mut stream = repository.subscribe_contacts();
        let subscription = stream.handle();

        let (contacts_tx, contacts_rx) = watch::channel(ContactList::new());
        tokio::spawn(async move {
            // Latest push wins: each snapshot replaces the list wholesale.
            while let Some(list) = stream.next().await {
                contacts_tx.send_replace(list);
            }
            debug!("contact sync task stopped");
        });

        let (mutations_tx, mut mutations_rx) =
            mpsc::channel::<Mutation>(config.mutation_queue_capacity.max(1));
        let (errors_tx, errors_rx) = mpsc::channel(config.error_queue_capacity.max(1));

        let worker_errors = errors_tx.clone();
        tokio::spawn(async move {
            while let Some(mutation) = mutations_rx.recv().await {
                let operation = mutation.operation();
                let result = match mutation {
                    Mutation::Add { name, number } => {
                        repository.add_contact(&name, &number).await
                    }
                    Mutation::Update { id, name, number } => {
                        repository.update_contact(&id, &name, &number).await
                    }
                    Mutation::Delete { id } => repository.delete_contact(&id).await,
                };
                if let Err(err) = result {
                    warn!("{operation} failed: {err}");
                    if worker_errors.try_send(err).is_err() {
                        debug!("error channel full or unobserved");
                    }
                }
            }
            debug!("mutation worker stopped");
        });

        Self {
            contacts: contacts_rx,
            mutations: mutations_tx,
            errors_tx,
            errors_rx: Mutex::new(Some(errors_rx)),
            subscription,
        }
    }

    /// Get the current contact list.
    ///
    /// Between a mutation and the push that reflects it, this may return
    /// stale state; that is the eventual-consistency contract.
    #[must_use]
    pub fn contacts(&self) -> ContactList {
        self.contacts.borrow().clone()
    }

    /// Get a watch receiver that observes every list replacement.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ContactList> {
        self.contacts.clone()
    }

    /// Take the write-error channel.
    ///
    /// Failed writes are fire-and-forget for the caller; this channel is the
    /// optional place to observe them. Returns `None` if already taken.
    #[must_use]
    pub fn take_errors(&self) -> Option<mpsc::Receiver<Error>> {
        lock(&self.errors_rx).take()
    }

    /// Queue a contact creation. Returns immediately.
    pub fn add_contact(&self, name: impl Into<String>, number: impl Into<String>) {
        self.enqueue(Mutation::Add {
            name: name.into(),
            number: number.into(),
        });
    }

    /// Queue a contact update. Returns immediately.
    pub fn update_contact(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        number: impl Into<String>,
    ) {
        self.enqueue(Mutation::Update {
            id: id.into(),
            name: name.into(),
            number: number.into(),
        });
    }

    /// Queue a contact deletion. Returns immediately.
    pub fn delete_contact(&self, id: impl Into<String>) {
        self.enqueue(Mutation::Delete { id: id.into() });
    }

    /// Cancel the live subscription and stop accepting mutations.
    ///
    /// After shutdown the list stops updating deterministically; queued
    /// mutations already handed to the worker still run to completion.
    pub fn shutdown(&self) {
        self.subscription.cancel();
    }

    /// Check whether this store has been shut down.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.subscription.is_cancelled()
    }

    fn enqueue(&self, mutation: Mutation) {
        let operation = mutation.operation();
        if self.is_shut_down() {
            warn!("store shut down, discarding {operation}");
            return;
        }
        match self.mutations.try_send(mutation) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                let err = Error::MutationQueueFull { operation };
                warn!("{err}");
                if self.errors_tx.try_send(err).is_err() {
                    debug!("error channel full or unobserved");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("mutation worker gone, discarding {operation}");
            }
        }
    }
}

impl Drop for ContactStore {
    fn drop(&mut self) {
        // The subscription is the only long-lived remote resource; never
        // leak it past the holder's lifetime.
        self.subscription.cancel();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
