//! Browser collaborators: `window.localStorage` and `window.alert`

use wasm_bindgen::JsValue;

use super::{Notifier, Storage};
use crate::error::{StorageError, StoreError};

/// `window.localStorage` for the page's origin
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Open the origin's LocalStorage.
    ///
    /// Fails when there is no window or storage access is denied
    /// (e.g. privacy settings, sandboxed iframes).
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(js_error_text(&e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is null".to_string()))?;

        Ok(Self { storage })
    }
}

impl Storage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Rejected(js_error_text(&e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected(js_error_text(&e)))
    }
}

/// Blocking `window.alert` plus the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNotifier;

impl Notifier for BrowserNotifier {
    fn alert(&self, message: &str) {
        match web_sys::window() {
            Some(window) => {
                if let Err(e) = window.alert_with_message(message) {
                    log::warn!("alert failed ({}): {}", js_error_text(&e), message);
                }
            }
            None => log::warn!("{}", message),
        }
    }

    fn log_failure(&self, error: &StoreError) {
        log::error!("{}", error);
    }
}

/// Best-effort text for a thrown JS value (DOMException, string, ...)
pub(crate) fn js_error_text(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
