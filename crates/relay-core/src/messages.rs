//! Messages delivered to a connected session.
//!
//! Every frame the bridge pushes to a client is a JSON object tagged by
//! `type`. Out-of-band replies carry a single `message` string; broker
//! notifications carry the subscription id and the changed context element.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{SessionId, SubscriptionId};

/// A frame pushed from the bridge to one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionMessage {
    /// Sent once on connect so the client learns its session id.
    SessionId {
        /// The assigned session id.
        message: String,
    },
    /// A `register` request succeeded.
    SubscriptionId {
        /// The broker-assigned subscription id.
        message: String,
    },
    /// An `unregister` request succeeded.
    RemoveSubscription {
        /// The removed subscription id.
        message: String,
    },
    /// A request failed; `message` is human-readable.
    Error {
        /// Failure description.
        message: String,
    },
    /// A broker change notification.
    #[serde(rename_all = "camelCase")]
    Notification {
        /// Subscription the notification belongs to.
        subscription_id: SubscriptionId,
        /// The changed context element, passed through untouched.
        element: Value,
    },
}

impl SessionMessage {
    /// Greeting carrying the session's own id.
    pub fn session_id(id: &SessionId) -> Self {
        Self::SessionId {
            message: id.to_string(),
        }
    }

    /// Error reply.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the variant (the `type` tag).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionId { .. } => "sessionId",
            Self::SubscriptionId { .. } => "subscriptionId",
            Self::RemoveSubscription { .. } => "removeSubscription",
            Self::Error { .. } => "error",
            Self::Notification { .. } => "notification",
        }
    }
}
