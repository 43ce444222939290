//! WebSocket module for real-time list updates
//!
//! Provides the WebSocket endpoint at `/todohub` through which every
//! mutation's full snapshot is pushed to all connected clients.
//!
//! ## Features
//! - `ReceiveTodos` push carrying the complete list after each mutation
//! - Revision counter so clients can order pulls against pushes
//! - Per-session bounded queues with a delivery timeout
//! - Explicitly owned hub, no global state

pub mod events;
pub mod handler;
pub mod hub;
pub mod session;
pub mod state;

// Re-export commonly used items
pub use events::ServerMessage;
pub use hub::{BroadcastHub, BroadcastReport};
pub use session::{Session, SessionId, SessionState};
pub use state::AppState;
