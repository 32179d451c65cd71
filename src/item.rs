//! To-do item record
//!
//! Field names match the stored JSON (`{"id": ..., "toDo": ...}`).

use serde::{Deserialize, Serialize};

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Caller-supplied identifier (uniqueness is not enforced)
    pub id: String,
    /// Free-form text
    #[serde(rename = "toDo")]
    pub to_do: String,
}

/// The ordered item collection owned by the store
pub type Items = Vec<Item>;

impl Item {
    pub fn new(id: impl Into<String>, to_do: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            to_do: to_do.into(),
        }
    }
}
