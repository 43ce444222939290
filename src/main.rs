//! Todo Sync Server - Binary Entry Point
//!
//! This is the main entry point for the todo-server binary.

use std::sync::Arc;

use tokio::sync::Notify;

use todo_sync::config::ServerConfig;
use todo_sync::logging;
use todo_sync::server::TodoServer;
use todo_sync::types::AppResult;

#[tokio::main]
async fn main() -> AppResult<()> {
    logging::init();

    let config = ServerConfig::from_env();
    let server = TodoServer::open(config)?;
    let listener = server.bind().await?;

    // Ctrl+C / SIGTERM triggers graceful shutdown
    let stop = Arc::new(Notify::new());
    let signal = stop.clone();
    ctrlc::set_handler(move || signal.notify_one())?;

    server
        .serve(listener, async move { stop.notified().await })
        .await?;
    Ok(())
}
