//! Client sync agent
//!
//! One background task per client owns the push channel. It pulls the full
//! list once at startup, then keeps a WebSocket open to the hub, replacing
//! the local view with every pushed snapshot. Each time a session is
//! confirmed the list is pulled again, so broadcasts missed while
//! disconnected are made up for. A lost connection is retried at a fixed
//! interval until the policy gives up or the handle shuts the task down.

use std::time::Duration;

use futures::StreamExt;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::config::ClientConfig;
use super::http::TodoClient;
use super::view::ClientView;
use crate::api::websocket::events::ServerMessage;
use crate::types::{Item, ItemId, TodoError, TodoResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state of the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Disconnected,
    Connecting,
    Synced,
    /// Waiting before the next attempt; `attempt` counts consecutive failures
    Reconnecting { attempt: u32 },
    Stopped,
}

/// Why a connected session ended
enum SessionEnd {
    Shutdown,
    Lost(TodoError),
}

/// Resolves once shutdown is requested or the handle is gone
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

struct SyncAgent {
    config: ClientConfig,
    client: TodoClient,
    view_tx: watch::Sender<ClientView>,
    state_tx: watch::Sender<AgentState>,
}

impl SyncAgent {
    fn set_state(&self, state: AgentState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!(from = ?current, to = ?state, "agent state");
            *current = state;
            true
        });
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tokio::select! {
            _ = cancelled(&mut shutdown) => {
                self.set_state(AgentState::Stopped);
                return;
            }
            _ = self.refresh() => {}
        }

        let mut failures: u32 = 0;
        loop {
            self.set_state(AgentState::Connecting);

            let attempt = tokio::select! {
                _ = cancelled(&mut shutdown) => break,
                result = self.connect() => result,
            };

            let reason = match attempt {
                Ok(ws) => {
                    failures = 0;
                    match self.run_session(ws, &mut shutdown).await {
                        SessionEnd::Shutdown => break,
                        SessionEnd::Lost(e) => e,
                    }
                }
                Err(e) => e,
            };

            failures = failures.saturating_add(1);
            if !self.config.retry.allows(failures) {
                error!(failures, error = %reason, "giving up on push channel");
                break;
            }

            warn!(
                error = %reason,
                attempt = failures,
                retry_in = ?self.config.retry.interval,
                "push channel down, retrying"
            );
            self.set_state(AgentState::Reconnecting { attempt: failures });

            tokio::select! {
                _ = cancelled(&mut shutdown) => break,
                _ = tokio::time::sleep(self.config.retry.interval) => {}
            }
        }

        self.set_state(AgentState::Stopped);
        info!("sync agent stopped");
    }

    async fn connect(&self) -> TodoResult<WsStream> {
        let url = self.config.hub_url();
        match tokio::time::timeout(self.config.request_timeout, connect_async(url.as_str())).await {
            Ok(Ok((ws, _response))) => {
                debug!(url = %url, "push channel open");
                Ok(ws)
            }
            Ok(Err(e)) => Err(TodoError::ConnectionLost(e.to_string())),
            Err(_) => Err(TodoError::ConnectionLost(format!(
                "connect timed out after {:?}",
                self.config.request_timeout
            ))),
        }
    }

    async fn run_session(
        &self,
        mut ws: WsStream,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SessionEnd {
        loop {
            let frame = tokio::select! {
                _ = cancelled(shutdown) => {
                    let _ = ws.close(None).await;
                    return SessionEnd::Shutdown;
                }
                frame = ws.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(ServerMessage::Connected { session_id, .. }) => {
                        info!(session = %session_id, "synced with hub");
                        self.set_state(AgentState::Synced);
                        tokio::select! {
                            _ = cancelled(shutdown) => {
                                let _ = ws.close(None).await;
                                return SessionEnd::Shutdown;
                            }
                            _ = self.refresh() => {}
                        }
                    }
                    Ok(ServerMessage::ReceiveTodos {
                        todos, revision, ..
                    }) => {
                        let applied = self
                            .view_tx
                            .send_if_modified(|view| view.apply_push(todos, revision));
                        debug!(revision, applied, "snapshot received");
                    }
                    Err(e) => warn!(error = %e, "ignoring unreadable message"),
                },
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Lost(TodoError::ConnectionLost(
                        "closed by server".to_string(),
                    ));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Lost(TodoError::ConnectionLost(e.to_string())),
            }
        }
    }

    /// Pull the full list and replace the view with it
    async fn refresh(&self) {
        match self.client.list().await {
            Ok((snapshot, revision)) => {
                self.view_tx.send_modify(|view| view.reset(snapshot, revision));
            }
            Err(e) => {
                warn!(error = %e, "snapshot pull failed, keeping last view");
                self.view_tx.send_modify(ClientView::invalidate_revision);
            }
        }
    }
}

/// Owner of a running sync agent
///
/// Dropping the handle cancels the agent as well.
pub struct SyncHandle {
    client: TodoClient,
    view_rx: watch::Receiver<ClientView>,
    state_rx: watch::Receiver<AgentState>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Spawn the agent on the current tokio runtime
    pub fn start(config: ClientConfig) -> TodoResult<Self> {
        let client = TodoClient::new(&config)?;
        let (view_tx, view_rx) = watch::channel(ClientView::new());
        let (state_tx, state_rx) = watch::channel(AgentState::Disconnected);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let agent = SyncAgent {
            config,
            client: client.clone(),
            view_tx,
            state_tx,
        };
        let task = tokio::spawn(agent.run(shutdown_rx));

        Ok(Self {
            client,
            view_rx,
            state_rx,
            shutdown_tx,
            task: Some(task),
        })
    }

    /// Current local view
    pub fn view(&self) -> ClientView {
        self.view_rx.borrow().clone()
    }

    pub fn state(&self) -> AgentState {
        *self.state_rx.borrow()
    }

    pub fn watch_view(&self) -> watch::Receiver<ClientView> {
        self.view_rx.clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<AgentState> {
        self.state_rx.clone()
    }

    /// Wait until the view satisfies `pred` and return it
    pub async fn wait_for_view<F>(&self, pred: F) -> ClientView
    where
        F: Fn(&ClientView) -> bool,
    {
        let mut rx = self.view_rx.clone();
        loop {
            {
                let view = rx.borrow_and_update();
                if pred(&view) {
                    return view.clone();
                }
            }
            if rx.changed().await.is_err() {
                return rx.borrow().clone();
            }
        }
    }

    /// Wait until the agent reaches `state`
    pub async fn wait_for_state(&self, state: AgentState) {
        let mut rx = self.state_rx.clone();
        loop {
            if *rx.borrow_and_update() == state {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Request creation; the view changes only when the broadcast arrives
    pub async fn create(&self, title: &str) -> TodoResult<Item> {
        self.client.create(title).await
    }

    pub async fn set_complete(&self, id: ItemId, is_complete: bool) -> TodoResult<()> {
        self.client.set_complete(id, is_complete).await
    }

    pub async fn delete(&self, id: ItemId) -> TodoResult<()> {
        self.client.delete(id).await
    }

    /// Stop the agent and wait for its task to finish
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "sync agent task failed");
            }
        }
    }

    /// Stop the agent, giving up on waiting after `timeout`
    pub async fn shutdown_timeout(self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.shutdown()).await.is_ok()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}
