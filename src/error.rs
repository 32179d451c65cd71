//! Storage and store failure types

use std::sync::Arc;

use thiserror::Error;

use crate::consts::{LOAD_FAILURE_MESSAGE, SAVE_FAILURE_MESSAGE};

/// Failure reported by a [`Storage`](crate::platform::Storage) backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded: need {needed} bytes, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("storage rejected the operation: {0}")]
    Rejected(String),
}

/// Which side of the persistence cycle failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Load,
    Save,
}

/// Failure while loading or saving the item collection.
///
/// None of these reach callers of `set`/`update`/`subscribe`; they are
/// logged, optionally alerted, and delivered to failure listeners.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Stored value is present but is not a valid item collection
    #[error("failed to decode stored items: {0}")]
    Decode(#[source] Arc<serde_json::Error>),

    /// Storage could not be read
    #[error("failed to read stored items: {0}")]
    Read(#[source] StorageError),

    /// Collection could not be serialized
    #[error("failed to encode items: {0}")]
    Encode(#[source] Arc<serde_json::Error>),

    /// Storage refused the write
    #[error("failed to write items: {0}")]
    Write(#[source] StorageError),
}

impl StoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StoreError::Decode(_) | StoreError::Read(_) => FailureKind::Load,
            StoreError::Encode(_) | StoreError::Write(_) => FailureKind::Save,
        }
    }

    /// Fixed text shown to the user, or `None` when nothing should be shown.
    ///
    /// A read failure means nothing was found, so there is nothing to warn
    /// the user about losing.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            StoreError::Decode(_) => Some(LOAD_FAILURE_MESSAGE),
            StoreError::Read(_) => None,
            StoreError::Encode(_) | StoreError::Write(_) => Some(SAVE_FAILURE_MESSAGE),
        }
    }
}
