//! Live session directory: session id → outbound queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use metrics::{counter, gauge};
use parking_lot::RwLock;
use relay_core::metric_names::{WS_CONNECTIONS_ACTIVE, WS_DELIVERY_DROPS_TOTAL};
use relay_core::{SessionId, SessionMessage};
use relay_runtime::SessionDelivery;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Maximum total lifetime message drops before forcibly disconnecting a slow client.
const MAX_TOTAL_DROPS: u64 = 100;

/// Outbound side of one connection.
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::Sender<Arc<String>>,
    drops: AtomicU64,
    evicted: CancellationToken,
}

impl SessionHandle {
    /// Create a handle over the connection's outbound queue.
    pub fn new(id: SessionId, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            drops: AtomicU64::new(0),
            evicted: CancellationToken::new(),
        }
    }

    /// Session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Queue a frame without waiting. Returns `false` if it was dropped.
    pub fn try_send(&self, json: Arc<String>) -> bool {
        match self.tx.try_send(json) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let _ = self.drops.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Queue a frame, waiting for room. Used for replies to the client's own
    /// requests, which must not be dropped.
    ///
    /// Gives up with `false` once the session is evicted, so a client that
    /// stopped reading cannot park the caller.
    pub async fn send(&self, message: &SessionMessage) -> bool {
        let json = match serde_json::to_string(message) {
            Ok(json) => Arc::new(json),
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "failed to serialize frame");
                return false;
            }
        };
        tokio::select! {
            biased;
            () = self.evicted.cancelled() => false,
            sent = self.tx.send(json) => sent.is_ok(),
        }
    }

    /// Total frames dropped for this session.
    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Whether the outbound queue's receiver is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the directory evicted this session.
    pub async fn evicted(&self) {
        self.evicted.cancelled().await;
    }
}

/// All live sessions. Implements [`SessionDelivery`] for the router.
#[derive(Default)]
pub struct SessionDirectory {
    sessions: RwLock<HashMap<SessionId, Arc<SessionHandle>>>,
}

impl SessionDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session.
    pub fn add(&self, handle: Arc<SessionHandle>) {
        let mut sessions = self.sessions.write();
        let _ = sessions.insert(handle.id.clone(), handle);
        gauge!(WS_CONNECTIONS_ACTIVE).set(sessions.len() as f64);
    }

    /// Remove a session. Returns whether it was present.
    pub fn remove(&self, session_id: &SessionId) -> bool {
        let mut sessions = self.sessions.write();
        let removed = sessions.remove(session_id).is_some();
        gauge!(WS_CONNECTIONS_ACTIVE).set(sessions.len() as f64);
        removed
    }

    /// Look up a session.
    pub fn get(&self, session_id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Whether no session is connected.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict(&self, handle: &SessionHandle) {
        warn!(session_id = %handle.id, drops = handle.drop_count(), "disconnecting slow client");
        let _ = self.remove(&handle.id);
        handle.evicted.cancel();
    }
}

#[async_trait]
impl SessionDelivery for SessionDirectory {
    async fn deliver(&self, session_id: &SessionId, message: SessionMessage) -> bool {
        let Some(handle) = self.get(session_id) else {
            debug!(session_id = %session_id, "no live session for delivery");
            return false;
        };
        let json = match serde_json::to_string(&message) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to serialize frame");
                return false;
            }
        };
        if handle.try_send(json) {
            return true;
        }
        if handle.is_closed() {
            let _ = self.remove(session_id);
            return false;
        }
        counter!(WS_DELIVERY_DROPS_TOTAL).increment(1);
        let drops = handle.drop_count();
        if drops >= MAX_TOTAL_DROPS {
            self.evict(&handle);
        } else {
            warn!(session_id = %session_id, total_drops = drops, "failed to deliver frame (channel full)");
        }
        false
    }
}
