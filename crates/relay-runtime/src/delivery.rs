//! The seam between the router and the transport layer.

use async_trait::async_trait;
use relay_core::{SessionId, SessionMessage};

/// Pushes a message to a live session.
#[async_trait]
pub trait SessionDelivery: Send + Sync {
    /// Deliver `message` to `session_id`.
    ///
    /// Returns `false` when the session is gone or could not accept the
    /// message. Never blocks on a slow client.
    async fn deliver(&self, session_id: &SessionId, message: SessionMessage) -> bool;
}
