//! To-do item types

use serde::{Deserialize, Serialize};

/// Store-assigned item identity
pub type ItemId = i64;

/// A single entry in the shared list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    #[serde(default)]
    pub is_complete: bool,
}

impl Item {
    /// Create a new, incomplete item
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            is_complete: false,
        }
    }
}

/// Body of `POST /todos`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItem {
    pub title: String,
}

/// Body of `PUT /todos/{id}`
///
/// Extra fields (a full item echoed back by older clients) are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    pub is_complete: bool,
}
