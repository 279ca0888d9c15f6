//! Error types for contactsync.
//!
//! This module defines all error types used throughout the contactsync crate,
//! covering remote write failures, subscription failures, and configuration
//! problems.

use thiserror::Error;

/// The main error type for contactsync operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Remote Write Errors ===
    /// A create/update/delete against the remote collection failed at the
    /// transport or service level.
    #[error("remote write failed during {operation}: {message}")]
    RemoteWrite {
        /// The operation that failed (`create`, `update`, or `delete`).
        operation: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// An update addressed a document id that does not exist at the remote.
    #[error("no document with id '{id}'")]
    NotFound {
        /// The id that could not be resolved.
        id: String,
    },

    // === Subscription Errors ===
    /// The live collection listener reported a failure (permission denial,
    /// disconnect). These are confined to the subscription boundary and are
    /// never propagated into state-holder code.
    #[error("subscription error: {0}")]
    Subscription(String),

    // === State Holder Errors ===
    /// The bounded mutation queue was full and the mutation was dropped.
    #[error("mutation queue full, dropped {operation}")]
    MutationQueueFull {
        /// The mutation that was dropped.
        operation: &'static str,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for contactsync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new remote write error.
    #[must_use]
    pub fn remote_write(operation: &'static str, message: impl Into<String>) -> Self {
        Self::RemoteWrite {
            operation,
            message: message.into(),
        }
    }

    /// Create a new not-found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create a new subscription error.
    #[must_use]
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error means the targeted document does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error is a remote write failure.
    #[must_use]
    pub fn is_remote_write(&self) -> bool {
        matches!(self, Self::RemoteWrite { .. })
    }

    /// Check if this error originated at the subscription boundary.
    #[must_use]
    pub fn is_subscription(&self) -> bool {
        matches!(self, Self::Subscription(_))
    }
}
