//! Todo server
//!
//! Wires the store, hub, gateway and router together and runs the HTTP
//! listener until a shutdown signal arrives.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::http::{cors_layer, create_router};
use crate::api::websocket::{AppState, BroadcastHub};
use crate::config::ServerConfig;
use crate::store::{FileStore, ItemStore};
use crate::types::TodoResult;

/// Assembled server, ready to serve
pub struct TodoServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl TodoServer {
    /// Open the file store named in `config` and build the server around it
    pub fn open(config: ServerConfig) -> TodoResult<Self> {
        let store = FileStore::open(&config.db_path)?;
        info!(path = %config.db_path.display(), "item store opened");
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Build the server around an existing store
    pub fn with_store(config: ServerConfig, store: Arc<dyn ItemStore>) -> Self {
        let hub = Arc::new(BroadcastHub::with_config(
            config.session_buffer,
            config.send_timeout,
        ));
        let state = Arc::new(AppState::new(store, hub));
        Self { config, state }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone(), cors_layer(&self.config.frontend_origin))
    }

    /// Bind the configured address
    pub async fn bind(&self) -> io::Result<TcpListener> {
        TcpListener::bind(self.config.bind_addr).await
    }

    /// Serve on `listener` until `shutdown` resolves
    ///
    /// On shutdown every hub session is closed so open sockets do not hold
    /// the graceful shutdown up.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(addr = ?addr, "todo server listening");

        let hub = self.state.hub.clone();
        let app = self.router();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("shutting down");
                hub.close_all();
            })
            .await
    }
}
