//! Data types for the to-do sync server
//!
//! This module contains the core data structures shared by the server and the client.

mod error;
mod item;
mod snapshot;

pub use error::TodoError;
pub use item::{CreateItem, Item, ItemId, UpdateItem};
pub use snapshot::Snapshot;

/// Result type for store, gateway and client operations
pub type TodoResult<T> = Result<T, TodoError>;

/// Result type for binary entry points
pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
