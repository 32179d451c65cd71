//! Save/load of the item collection
//!
//! Format: a JSON array of `{"id": ..., "toDo": ...}` objects in collection
//! order, stored as one string under a single key. An empty collection is
//! `[]`. There is no envelope or version field.

use std::sync::Arc;

use crate::error::StoreError;
use crate::item::{Item, Items};
use crate::platform::Storage;

/// Serialize the collection to its stored form
pub fn encode_items(items: &[Item]) -> Result<String, StoreError> {
    serde_json::to_string(items).map_err(|e| StoreError::Encode(Arc::new(e)))
}

/// Parse a stored value back into a collection
pub fn decode_items(raw: &str) -> Result<Items, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Decode(Arc::new(e)))
}

/// Read and decode the collection under `key`.
///
/// `Ok(None)` means nothing is stored. An empty string counts as nothing
/// stored, the same as a missing key.
pub fn read_items(storage: &dyn Storage, key: &str) -> Result<Option<Items>, StoreError> {
    let raw = storage.get_item(key).map_err(StoreError::Read)?;
    match raw {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => decode_items(&raw).map(Some),
    }
}

/// Encode and write the collection under `key`
pub fn write_items(storage: &dyn Storage, key: &str, items: &[Item]) -> Result<(), StoreError> {
    let encoded = encode_items(items)?;
    storage.set_item(key, &encoded).map_err(StoreError::Write)?;
    log::debug!("Saved {} items ({} bytes)", items.len(), encoded.len());
    Ok(())
}
