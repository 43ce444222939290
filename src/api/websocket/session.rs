//! Hub sessions
//!
//! A session is the hub's handle on one connected client: an id, a
//! liveness state, and the sending half of a bounded outbound queue. The
//! WebSocket handler owns the receiving half and writes it to the socket.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::events::ServerMessage;
use crate::types::{TodoError, TodoResult};

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Opaque session identity
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new unique session ID
    pub fn generate() -> Self {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let n = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("sess_{:x}_{}", nanos, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Liveness of a session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// Receiving half of a session's outbound queue
pub type SessionReceiver = mpsc::Receiver<Arc<ServerMessage>>;

/// Hub-side handle on one connected client
#[derive(Clone)]
pub struct Session {
    id: SessionId,
    tx: mpsc::Sender<Arc<ServerMessage>>,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Create a session in state `Connecting` with a queue of `capacity` messages
    pub fn new(capacity: usize) -> (Self, SessionReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let session = Self {
            id: SessionId::generate(),
            tx,
            state: Arc::new(Mutex::new(SessionState::Connecting)),
        };
        (session, rx)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }

    /// Queue a message, waiting at most `timeout` for room
    pub async fn deliver(&self, msg: Arc<ServerMessage>, timeout: Duration) -> TodoResult<()> {
        match tokio::time::timeout(timeout, self.tx.send(msg)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(self.delivery_failed("receiver closed")),
            Err(_) => Err(self.delivery_failed(format!("timed out after {:?}", timeout))),
        }
    }

    fn delivery_failed(&self, reason: impl Into<String>) -> TodoError {
        TodoError::ChannelDeliveryFailed {
            session: self.id.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
