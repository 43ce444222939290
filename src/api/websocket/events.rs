//! WebSocket message types for real-time list updates

use serde::{Deserialize, Serialize};

use crate::types::Snapshot;
use crate::utils::current_timestamp;

/// Messages sent from the server to connected clients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Sent once when the session has joined the hub
    #[serde(rename = "connected", rename_all = "camelCase")]
    Connected { session_id: String, revision: u64 },

    /// Full authoritative list after a mutation
    #[serde(rename = "ReceiveTodos")]
    ReceiveTodos {
        todos: Snapshot,
        /// Monotonically increasing broadcast counter
        revision: u64,
        /// Unix timestamp when the broadcast was issued
        timestamp: i64,
    },
}

impl ServerMessage {
    pub fn connected(session_id: impl Into<String>, revision: u64) -> Self {
        ServerMessage::Connected {
            session_id: session_id.into(),
            revision,
        }
    }

    pub fn receive_todos(todos: Snapshot, revision: u64) -> Self {
        ServerMessage::ReceiveTodos {
            todos,
            revision,
            timestamp: current_timestamp(),
        }
    }
}
