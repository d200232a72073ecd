//! Client → bridge frames and their handling.

use relay_core::{SessionId, SessionMessage, SubscriptionId};
use relay_runtime::{RegisterRequest, SubscriptionRegistry};
use serde::Deserialize;
use tracing::{debug, info};

/// A request frame from a client.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Subscribe to changes of an entity.
    #[serde(rename_all = "camelCase")]
    Register {
        /// What to watch.
        subscription: RegisterRequest,
        /// Client id checked against private entities.
        #[serde(default)]
        client_id: String,
    },
    /// Remove a subscription.
    Unregister {
        /// Subscription id.
        message: SubscriptionId,
    },
}

/// Parse and execute one text frame; returns the reply.
pub async fn dispatch(
    registry: &SubscriptionRegistry,
    session_id: &SessionId,
    text: &str,
) -> SessionMessage {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(f) => f,
        Err(e) => {
            debug!(session_id = %session_id, error = %e, "unparseable client frame");
            return SessionMessage::error(format!("Invalid message: {e}"));
        }
    };

    match frame {
        ClientFrame::Register {
            subscription,
            client_id,
        } => {
            let entity_id = subscription.entity_id.clone();
            info!(session_id = %session_id, entity_id = %entity_id, "register requested");
            match registry.register(session_id, &client_id, subscription).await {
                Ok(id) => SessionMessage::SubscriptionId {
                    message: id.into_inner(),
                },
                Err(e) => SessionMessage::error(format!("Subscription not added {entity_id}: {e}")),
            }
        }
        ClientFrame::Unregister { message: id } => {
            info!(session_id = %session_id, subscription_id = %id, "unregister requested");
            match registry.unregister(&id, session_id).await {
                Ok(removed) => SessionMessage::RemoveSubscription {
                    message: removed.into_inner(),
                },
                Err(_) => SessionMessage::error(format!("Subscription not removed {id}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_register_frame() {
        let f: ClientFrame = serde_json::from_str(
            r#"{"type":"register","clientId":"client-a","subscription":{"entityId":"room:42","attributes":["temperature"]}}"#,
        )
        .unwrap();
        match f {
            ClientFrame::Register {
                subscription,
                client_id,
            } => {
                assert_eq!(client_id, "client-a");
                assert_eq!(subscription.entity_id, "room:42");
                assert_eq!(subscription.attributes, vec!["temperature"]);
            }
            ClientFrame::Unregister { .. } => panic!("expected register"),
        }
    }

    #[test]
    fn parse_register_without_client_id() {
        let f: ClientFrame =
            serde_json::from_str(r#"{"type":"register","subscription":{"entityId":"x"}}"#).unwrap();
        assert!(matches!(f, ClientFrame::Register { ref client_id, .. } if client_id.is_empty()));
    }

    #[test]
    fn parse_unregister_frame() {
        let f: ClientFrame =
            serde_json::from_str(r#"{"type":"unregister","message":"sub-1"}"#).unwrap();
        assert!(matches!(f, ClientFrame::Unregister { ref message } if message.as_str() == "sub-1"));
    }

    #[test]
    fn reject_unknown_type() {
        assert!(serde_json::from_str::<ClientFrame>(r#"{"type":"hello"}"#).is_err());
        assert!(serde_json::from_str::<ClientFrame>("not json").is_err());
    }
}
