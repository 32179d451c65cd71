//! Todo Items - a reactive, persisted to-do collection for browser front-ends
//!
//! Core modules:
//! - `store`: the persisted item store (load, subscribe, set, update)
//! - `observable`: observer lists and observable values
//! - `persistence`: JSON encoding and storage read/write
//! - `platform`: storage and alert collaborators (LocalStorage on web)
//! - `bindings`: JS-facing wrapper (wasm32 only)

pub mod config;
pub mod error;
mod handles;
pub mod item;
pub mod observable;
pub mod persistence;
pub mod platform;
pub mod store;

#[cfg(target_arch = "wasm32")]
pub mod bindings;

pub use config::StoreConfig;
pub use error::{FailureKind, StorageError, StoreError};
pub use item::{Item, Items};
pub use observable::{Listeners, Observable, Subscription, SubscriptionId};
pub use platform::{LogNotifier, MemoryStorage, Notifier, Storage};
pub use store::{ItemStore, LoadOutcome};

/// Fixed storage key and user-facing messages
pub mod consts {
    /// Storage slot holding the encoded collection
    pub const STORAGE_KEY: &str = "items";

    /// Shown when a stored value exists but cannot be decoded
    pub const LOAD_FAILURE_MESSAGE: &str = "Found items, but failed to load them!";
    /// Shown when a change cannot be written to storage
    pub const SAVE_FAILURE_MESSAGE: &str = "Failed to save items!";
}
