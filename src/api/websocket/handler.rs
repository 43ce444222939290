//! WebSocket connection handler

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, warn};

use super::events::ServerMessage;
use super::session::SessionReceiver;
use super::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let hub = state.hub.clone();
    let send_timeout = hub.send_timeout();
    let (session, rx) = hub.new_session();
    let id = session.id().clone();
    hub.register(session);

    let welcome = ServerMessage::connected(id.as_str(), hub.current_revision());
    if send_message(&mut socket, &welcome, send_timeout).await {
        pump(&mut socket, rx, send_timeout).await;
    }

    hub.unregister(&id);
    debug!(session = %id, "socket closed");
}

/// Forward queued messages to the socket until either side goes away
///
/// Every write is bounded by `send_timeout`; a peer that stops reading is
/// disconnected rather than left holding the task.
async fn pump<S>(socket: &mut S, mut rx: SessionReceiver, send_timeout: Duration)
where
    S: Sink<Message> + Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    loop {
        tokio::select! {
            queued = rx.recv() => {
                match queued {
                    Some(msg) => {
                        if !send_message(socket, &msg, send_timeout).await {
                            break; // Client disconnected or stalled
                        }
                    }
                    None => {
                        // Hub dropped this session
                        let _ = send_frame(socket, Message::Close(None), send_timeout).await;
                        break;
                    }
                }
            }

            incoming = socket.next() => {
                match incoming {
                    Some(Ok(msg)) => {
                        if !handle_client_frame(msg, socket, send_timeout).await {
                            break;
                        }
                    }
                    Some(Err(_)) => break, // WebSocket error
                    None => break, // Client disconnected
                }
            }
        }
    }
}

/// Serialize and send one message; false if the socket is gone
async fn send_message<S>(socket: &mut S, msg: &ServerMessage, send_timeout: Duration) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => send_frame(socket, Message::Text(json), send_timeout).await,
        Err(e) => {
            warn!(error = %e, "failed to serialize server message");
            true
        }
    }
}

/// Write one frame, giving up after `send_timeout`
async fn send_frame<S>(socket: &mut S, frame: Message, send_timeout: Duration) -> bool
where
    S: Sink<Message> + Unpin,
{
    match tokio::time::timeout(send_timeout, socket.send(frame)).await {
        Ok(result) => result.is_ok(),
        Err(_) => {
            warn!(timeout = ?send_timeout, "socket write stalled, dropping connection");
            false
        }
    }
}

/// Handle a frame from the client
/// Returns false if the connection should be closed
async fn handle_client_frame<S>(msg: Message, socket: &mut S, send_timeout: Duration) -> bool
where
    S: Sink<Message> + Unpin,
{
    match msg {
        // The channel is push-only
        Message::Text(_) | Message::Binary(_) => true,
        Message::Ping(data) => send_frame(socket, Message::Pong(data), send_timeout).await,
        Message::Pong(_) => true,
        Message::Close(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use crate::api::websocket::session::Session;
    use crate::types::Snapshot;

    /// Peer that never reads and never sends
    struct StalledPeer;

    impl Sink<Message> for StalledPeer {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    impl Stream for StalledPeer {
        type Item = Result<Message, axum::Error>;

        fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            Poll::Pending
        }
    }

    #[tokio::test]
    async fn test_pump_drops_peer_that_stops_reading() {
        let (session, rx) = Session::new(4);
        let msg = Arc::new(ServerMessage::receive_todos(Snapshot::new(), 1));
        session.deliver(msg, Duration::from_millis(50)).await.unwrap();

        // The session stays alive, so only the write timeout can end the pump
        let mut peer = StalledPeer;
        let finished = tokio::time::timeout(
            Duration::from_secs(2),
            pump(&mut peer, rx, Duration::from_millis(50)),
        )
        .await;
        assert!(finished.is_ok());
        drop(session);
    }

    #[tokio::test]
    async fn test_stalled_welcome_is_abandoned() {
        let mut peer = StalledPeer;
        let welcome = ServerMessage::connected("sess_test", 0);
        let sent = tokio::time::timeout(
            Duration::from_secs(2),
            send_message(&mut peer, &welcome, Duration::from_millis(50)),
        )
        .await
        .unwrap();
        assert!(!sent);
    }
}
