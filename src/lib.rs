//! Todo Sync
//!
//! A shared to-do list with real-time snapshot synchronization: a CRUD
//! server that pushes the complete list to every connected client after
//! each mutation, and a client agent that keeps a local copy in step.
//!
//! # Features
//!
//! - **Full-snapshot push**: every mutation broadcasts the whole list (`ReceiveTodos`)
//! - **Single writer**: commit + broadcast are serialized per mutation
//! - **Isolated delivery**: a slow or dead client is dropped without stalling others
//! - **Self-healing client**: fixed-interval reconnect with a forced re-pull on every reconnect
//!
//! # Modules
//!
//! - `types`: Item, Snapshot and the error taxonomy
//! - `store`: Item store trait and JSON Lines file store
//! - `gateway`: Mutation gateway (commit-then-broadcast)
//! - `api`: REST endpoints, WebSocket hub and handler
//! - `client`: Sync agent, HTTP client and local view
//! - `config`: Server configuration from the environment
//! - `logging`: `tracing` subscriber setup
//! - `server`: Server assembly and graceful shutdown
//! - `utils`: Timestamps and atomic file writes
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_sync::api::http::{cors_layer, create_router};
//! use todo_sync::{AppState, BroadcastHub, FileStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(FileStore::open("todos.jsonl")?);
//!     let state = Arc::new(AppState::new(store, Arc::new(BroadcastHub::new())));
//!     let app = create_router(state, cors_layer("*"));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod server;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::websocket::{AppState, BroadcastHub, BroadcastReport, ServerMessage, SessionState};
pub use client::{AgentState, ClientConfig, ClientView, RetryPolicy, SyncHandle, TodoClient};
pub use config::ServerConfig;
pub use gateway::MutationGateway;
pub use server::TodoServer;
pub use store::{FileStore, ItemStore};
pub use types::{AppResult, Item, ItemId, Snapshot, TodoError, TodoResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
