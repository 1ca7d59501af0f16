//! Live Document Access
//!
//! Domain command handlers never touch application state directly. They get a
//! [`Document`], which runs a unit of work against the state under mutual
//! exclusion and exposes a read-only resource catalog.
//!
//! Waiting for the state lock is bounded: a handler that cannot acquire it
//! within the configured timeout gets a [`DocumentError::LockTimeout`] instead
//! of holding the dispatch task indefinitely.

use crate::commands::CommandError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

/// Default time a handler may wait for the document lock
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Timed out after {0:?} waiting for the document")]
    LockTimeout(Duration),
}

impl From<DocumentError> for CommandError {
    fn from(err: DocumentError) -> Self {
        CommandError::Unexpected(err.into())
    }
}

/// Shared, lock-protected application state plus a read-only catalog
pub struct Document<S> {
    state: Mutex<S>,
    catalog: Arc<Value>,
    lock_timeout: Duration,
}

impl<S> Document<S> {
    /// Wrap state with an empty catalog
    pub fn new(state: S) -> Self {
        Self::with_catalog(state, Value::Null)
    }

    pub fn with_catalog(state: S, catalog: Value) -> Self {
        Self {
            state: Mutex::new(state),
            catalog: Arc::new(catalog),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the lock wait bound
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Read-only catalog of resources handlers may consult
    pub fn catalog(&self) -> &Value {
        &self.catalog
    }

    /// Run `work` with exclusive access to the state
    pub async fn with_state<R>(&self, work: impl FnOnce(&mut S) -> R) -> Result<R, DocumentError> {
        match tokio::time::timeout(self.lock_timeout, self.state.lock()).await {
            Ok(mut guard) => Ok(work(&mut guard)),
            Err(_) => {
                warn!("Document lock not acquired within {:?}", self.lock_timeout);
                Err(DocumentError::LockTimeout(self.lock_timeout))
            }
        }
    }
}

impl<S: Clone> Document<S> {
    /// Clone the current state (used for checkpoints)
    pub async fn snapshot(&self) -> Result<S, DocumentError> {
        self.with_state(|state| state.clone()).await
    }

    /// Replace the current state wholesale (used for restores)
    pub async fn replace(&self, next: S) -> Result<(), DocumentError> {
        self.with_state(|state| *state = next).await
    }
}
