//! Error taxonomy shared by the server and the sync client

use std::io;

use thiserror::Error;

use super::ItemId;

/// Errors surfaced by the store, gateway, hub and client
#[derive(Debug, Error)]
pub enum TodoError {
    /// Mutation target does not exist
    #[error("item {0} not found")]
    NotFound(ItemId),

    /// Input rejected before any state change
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Persistence layer failure
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Push to a single session failed; handled inside the hub
    #[error("delivery to session {session} failed: {reason}")]
    ChannelDeliveryFailed { session: String, reason: String },

    /// Client lost (or never got) its connection to the server
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// Unexpected response or message shape
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<io::Error> for TodoError {
    fn from(e: io::Error) -> Self {
        TodoError::StoreUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(e: serde_json::Error) -> Self {
        TodoError::StoreUnavailable(e.to_string())
    }
}
