//! # Framework Errors
//!
//! This module defines the single error type shared by the loader, the executor
//! and the collection. Remote failures are carried verbatim so the caller that
//! awaited a mutation receives exactly the error its remote function raised.

use std::error::Error;
use std::sync::Arc;

/// Errors surfaced by the synchronization engine.
///
/// `SyncError` is cheap to clone: the remote variant shares its source behind an
/// `Arc`, which lets the same error be retained in published state *and* returned
/// to the awaiting caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    /// An update or delete targeted a key that is not in the collection.
    /// Raised before any remote call is made.
    #[error("Item with id {id} not found")]
    NotFound { id: String },

    /// An add targeted a key that is already present in the collection.
    #[error("Item with id {id} already exists")]
    AlreadyExists { id: String },

    /// The remote read or write rejected.
    #[error("{0}")]
    Remote(Arc<dyn Error + Send + Sync>),
}

impl SyncError {
    /// Wraps the error returned by a remote function.
    pub fn remote<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        SyncError::Remote(Arc::new(error))
    }

    pub fn not_found(id: impl ToString) -> Self {
        SyncError::NotFound { id: id.to_string() }
    }

    pub fn already_exists(id: impl ToString) -> Self {
        SyncError::AlreadyExists { id: id.to_string() }
    }

    /// Recovers the typed error a remote function raised, if this is one.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Error + 'static,
    {
        match self {
            SyncError::Remote(source) => (**source).downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SyncError::Remote(_))
    }
}
