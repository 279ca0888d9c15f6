//! Crash and diagnostics reporting.
//!
//! A sink for unexpected failures, separate from the data-sync contract.
//! Subscription errors that are swallowed at the listener boundary are
//! reported here so they remain observable.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::error;

use crate::error::Error;

/// A sink for unexpected failures and diagnostic key-value context.
pub trait CrashReporter: Send + Sync {
    /// Record an unexpected error.
    fn record_exception(&self, err: &Error);

    /// Attach a diagnostic key-value pair to subsequent reports.
    fn set_custom_key(&self, key: &str, value: &str);
}

/// A reporter that forwards everything to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl CrashReporter for TracingReporter {
    fn record_exception(&self, err: &Error) {
        error!("reported exception: {err}");
    }

    fn set_custom_key(&self, key: &str, value: &str) {
        error!(target: "contactsync::diagnostics", "{key}={value}");
    }
}

/// A reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl CrashReporter for NoopReporter {
    fn record_exception(&self, _err: &Error) {}

    fn set_custom_key(&self, _key: &str, _value: &str) {}
}

/// A reporter that records everything in memory, for assertions.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    exceptions: Mutex<Vec<String>>,
    custom_keys: Mutex<Vec<(String, String)>>,
}

impl RecordingReporter {
    /// Create an empty recording reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the recorded exception messages.
    #[must_use]
    pub fn exceptions(&self) -> Vec<String> {
        lock(&self.exceptions).clone()
    }

    /// Get the recorded custom keys.
    #[must_use]
    pub fn custom_keys(&self) -> Vec<(String, String)> {
        lock(&self.custom_keys).clone()
    }
}

impl CrashReporter for RecordingReporter {
    fn record_exception(&self, err: &Error) {
        lock(&self.exceptions).push(err.to_string());
    }

    fn set_custom_key(&self, key: &str, value: &str) {
        lock(&self.custom_keys).push((key.to_string(), value.to_string()));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
