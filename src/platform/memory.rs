//! In-memory storage backend
//!
//! Mirrors LocalStorage semantics closely enough to stand in for it:
//! string keys and values, an optional byte quota counted over all keys
//! and values, and a switch that makes the backend unavailable.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::Storage;
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    /// Maximum total bytes of keys plus values (None = unlimited)
    quota: Option<usize>,
    unavailable: Cell<bool>,
}

impl MemoryStorage {
    /// Create an empty, unlimited store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes past `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Seed a value without quota checks
    pub fn with_item(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.borrow_mut().insert(key.into(), value.into());
        self
    }

    /// Make every read and write fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.get() {
            return Err(StorageError::Unavailable(
                "memory storage switched off".to_string(),
            ));
        }
        Ok(())
    }

    /// Bytes used if `key` held `value`
    fn usage_with(&self, key: &str, value: &str) -> usize {
        let entries = self.entries.borrow();
        let others: usize = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        others + key.len() + value.len()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;

        if let Some(limit) = self.quota {
            let needed = self.usage_with(key, value);
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("items").unwrap(), None);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let storage = MemoryStorage::new();
        storage.set_item("items", "[]").unwrap();
        storage.set_item("items", "[1]").unwrap();
        assert_eq!(storage.get_item("items").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_quota_counts_keys_and_values() {
        // "items" (5) + "[]" (2) fits in 8, "[1,2]" (5) does not
        let storage = MemoryStorage::with_quota(8);
        storage.set_item("items", "[]").unwrap();

        let err = storage.set_item("items", "[1,2]").unwrap_err();
        assert_eq!(err, StorageError::QuotaExceeded { needed: 10, limit: 8 });
        // Failed write leaves the old value
        assert_eq!(storage.get_item("items").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_unavailable_fails_reads_and_writes() {
        let storage = MemoryStorage::new().with_item("items", "[]");
        storage.set_unavailable(true);
        assert!(matches!(
            storage.get_item("items"),
            Err(StorageError::Unavailable(_))
        ));
        assert!(storage.set_item("items", "[]").is_err());

        storage.set_unavailable(false);
        assert_eq!(storage.get_item("items").unwrap().as_deref(), Some("[]"));
    }
}
