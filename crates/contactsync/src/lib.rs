//! `contactsync` - A realtime-synchronized contact data layer
//!
//! This library provides the data layer for a contact list kept in sync
//! across devices through a remote document store's realtime listener:
//! a typed repository over the store, an observable state holder with
//! fire-and-forget mutations, and an explicit cancellable subscription
//! stream.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod contact;
pub mod diagnostics;
pub mod error;
pub mod form;
pub mod logging;
pub mod remote;
pub mod repository;
pub mod state;

pub use config::Config;
pub use contact::{Contact, ContactList};
pub use diagnostics::CrashReporter;
pub use error::{Error, Result};
pub use form::ContactForm;
pub use logging::init_logging;
pub use remote::{RemoteCollection, Subscription, SubscriptionHandle};
pub use repository::{ContactRepository, ContactStream};
pub use state::ContactStore;
