//! Store configuration
//!
//! Deserializable so a host page can pass it in as JSON or a JS object.

use serde::{Deserialize, Serialize};

use crate::consts::STORAGE_KEY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage slot holding the encoded collection
    #[serde(alias = "storageKey")]
    pub storage_key: String,
    /// Raise user-visible alerts on load/save failures.
    /// Logging and failure listeners fire regardless.
    pub alerts: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: STORAGE_KEY.to_string(),
            alerts: true,
        }
    }
}

impl StoreConfig {
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn without_alerts(mut self) -> Self {
        self.alerts = false;
        self
    }
}
