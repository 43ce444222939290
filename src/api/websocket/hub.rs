//! Broadcast hub
//!
//! Holds the set of connected sessions and fans a full snapshot out to all
//! of them. The session map lock is only held to insert, remove or copy
//! the set, never across a delivery, so a slow client cannot hold up new
//! registrations. Broadcasts themselves are serialized: every session sees
//! successive snapshots in the order they were issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::events::ServerMessage;
use super::session::{Session, SessionId, SessionReceiver, SessionState};
use crate::types::Snapshot;

/// Default outbound queue length per session
pub const DEFAULT_SESSION_BUFFER: usize = 32;

/// Default bound on how long one delivery may wait
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(2);

/// Outcome of one broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub revision: u64,
    pub delivered: usize,
    pub dropped: Vec<SessionId>,
}

/// Registry of live sessions
pub struct BroadcastHub {
    sessions: RwLock<HashMap<SessionId, Session>>,
    broadcast_lock: Mutex<()>,
    revision: AtomicU64,
    session_buffer: usize,
    send_timeout: Duration,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_SESSION_BUFFER, DEFAULT_SEND_TIMEOUT)
    }

    /// Create a hub with custom queue length and delivery timeout
    pub fn with_config(session_buffer: usize, send_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            broadcast_lock: Mutex::new(()),
            revision: AtomicU64::new(0),
            session_buffer,
            send_timeout,
        }
    }

    /// Create a session sized for this hub (not yet registered)
    pub fn new_session(&self) -> (Session, SessionReceiver) {
        Session::new(self.session_buffer)
    }

    /// Add a session; it receives every broadcast that starts after this returns
    pub fn register(&self, session: Session) {
        session.set_state(SessionState::Open);
        let id = session.id().clone();
        let count = {
            let mut sessions = self.sessions.write();
            sessions.insert(id.clone(), session);
            sessions.len()
        };
        info!(session = %id, sessions = count, "session registered");
    }

    /// Remove a session. Unknown ids are ignored.
    pub fn unregister(&self, id: &SessionId) {
        let removed = self.sessions.write().remove(id);
        if let Some(session) = removed {
            session.set_state(SessionState::Closed);
            info!(session = %id, "session unregistered");
        }
    }

    /// Drop every session, closing their queues
    pub fn close_all(&self) -> usize {
        let drained: Vec<Session> = self.sessions.write().drain().map(|(_, s)| s).collect();
        for session in &drained {
            session.set_state(SessionState::Closed);
        }
        if !drained.is_empty() {
            info!(sessions = drained.len(), "closed all sessions");
        }
        drained.len()
    }

    /// Deliver `snapshot` to every registered session
    ///
    /// Sessions that cannot accept the message within the send timeout are
    /// unregistered; their failure never affects the others or the caller.
    pub async fn broadcast(&self, snapshot: Snapshot) -> BroadcastReport {
        let _serial = self.broadcast_lock.lock().await;

        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let msg = Arc::new(ServerMessage::receive_todos(snapshot, revision));
        let targets: Vec<Session> = self.sessions.read().values().cloned().collect();

        let results = join_all(
            targets
                .iter()
                .map(|session| session.deliver(msg.clone(), self.send_timeout)),
        )
        .await;

        let mut delivered = 0;
        let mut dropped = Vec::new();
        for (session, result) in targets.iter().zip(results) {
            match result {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(error = %e, "dropping session after failed delivery");
                    self.unregister(session.id());
                    dropped.push(session.id().clone());
                }
            }
        }

        debug!(revision, delivered, dropped = dropped.len(), "broadcast complete");
        BroadcastReport {
            revision,
            delivered,
            dropped,
        }
    }

    /// Revision of the most recent broadcast (0 before the first)
    pub fn current_revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Bound on a single delivery, also applied to socket writes
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// State of a session; unknown ids read as `Closed`
    pub fn session_state(&self, id: &SessionId) -> SessionState {
        self.sessions
            .read()
            .get(id)
            .map(Session::state)
            .unwrap_or(SessionState::Closed)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
