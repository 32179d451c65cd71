//! Platform abstraction layer
//!
//! Collaborators the store is built against:
//! - `Storage`: synchronous string key-value slot (LocalStorage on web)
//! - `Notifier`: user-visible alerts and diagnostic logging
//!
//! `MemoryStorage` and `LogNotifier` work on every target; the browser
//! implementations are only compiled for wasm32.

mod memory;
#[cfg(target_arch = "wasm32")]
mod web;

pub use memory::MemoryStorage;
#[cfg(target_arch = "wasm32")]
pub use web::{BrowserNotifier, LocalStorage};

use crate::error::{StorageError, StoreError};

/// Synchronous string key-value storage
pub trait Storage {
    /// Read the value under `key`, `Ok(None)` if nothing is stored
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Side channels for failures the store absorbs
pub trait Notifier {
    /// Show a warning to the user
    fn alert(&self, message: &str);

    /// Record the failure detail for diagnostics
    fn log_failure(&self, error: &StoreError);
}

/// Notifier that only writes to the `log` facade.
///
/// Used natively, where there is no modal alert to show.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn alert(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn log_failure(&self, error: &StoreError) {
        log::error!("{}", error);
    }
}
