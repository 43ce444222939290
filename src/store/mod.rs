//! Item Store
//!
//! Durable record storage consumed by the mutation gateway through the
//! [`ItemStore`] trait. [`FileStore`] is the shipped implementation.

mod file;

pub use file::FileStore;

use crate::types::{Item, ItemId, TodoResult};

/// CRUD contract over items with a store-assigned identity
///
/// Every operation may fail with [`TodoError::StoreUnavailable`](crate::types::TodoError).
pub trait ItemStore: Send + Sync {
    /// All items in insertion order
    fn list_all(&self) -> TodoResult<Vec<Item>>;

    /// Insert a new incomplete item and return it with its assigned id
    fn create(&self, title: &str) -> TodoResult<Item>;

    fn find_by_id(&self, id: ItemId) -> TodoResult<Option<Item>>;

    /// Overwrite the stored item with the same id
    fn update(&self, item: &Item) -> TodoResult<()>;

    fn delete(&self, item: &Item) -> TodoResult<()>;
}
