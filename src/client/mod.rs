//! Client sync agent
//!
//! Keeps a local copy of the shared list in step with the server:
//! - [`SyncHandle`] spawns and owns the background agent task
//! - [`ClientView`] is the wholesale-replaced local copy
//! - [`TodoClient`] issues mutations over HTTP
//! - [`ClientConfig`] / [`RetryPolicy`] control endpoints and reconnects

mod agent;
mod config;
mod http;
mod view;

pub use agent::{AgentState, SyncHandle};
pub use config::{ClientConfig, RetryPolicy, DEFAULT_RETRY_INTERVAL, DEFAULT_SERVER_URL};
pub use http::TodoClient;
pub use view::ClientView;
