//! Notification router: broker push → owning session.

use std::sync::Arc;

use metrics::counter;
use relay_core::metric_names::RELAY_NOTIFICATIONS_TOTAL;
use relay_core::{SessionMessage, SubscriptionId};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::delivery::SessionDelivery;
use crate::registry::SubscriptionRegistry;

/// What happened to one inbound notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Handed to the owning session.
    Delivered,
    /// No session owns the subscription; discarded.
    Dropped,
    /// The owner exists but its session could not take the message.
    Undeliverable,
}

impl RouteOutcome {
    /// Metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Dropped => "dropped",
            Self::Undeliverable => "undeliverable",
        }
    }
}

/// Forwards broker notifications to the session owning the subscription.
pub struct NotificationRouter {
    registry: Arc<SubscriptionRegistry>,
    delivery: Arc<dyn SessionDelivery>,
}

impl NotificationRouter {
    /// Create a router over a registry and a delivery backend.
    pub fn new(registry: Arc<SubscriptionRegistry>, delivery: Arc<dyn SessionDelivery>) -> Self {
        Self { registry, delivery }
    }

    /// Route one changed element. Unknown ids are not an error.
    #[instrument(skip_all, fields(subscription_id = %subscription_id))]
    pub async fn route(&self, subscription_id: &SubscriptionId, element: Value) -> RouteOutcome {
        let outcome = match self.registry.owner_of(subscription_id) {
            None => {
                debug!("no session owns subscription, dropping notification");
                RouteOutcome::Dropped
            }
            Some(session_id) => {
                let message = SessionMessage::Notification {
                    subscription_id: subscription_id.clone(),
                    element,
                };
                if self.delivery.deliver(&session_id, message).await {
                    debug!(session_id = %session_id, "notification delivered");
                    RouteOutcome::Delivered
                } else {
                    info!(session_id = %session_id, "owning session could not take notification");
                    RouteOutcome::Undeliverable
                }
            }
        };
        counter!(RELAY_NOTIFICATIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{FakeGateway, registry};
    use crate::types::RegisterRequest;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use relay_core::SessionId;
    use serde_json::json;
    use std::collections::HashSet;

    /// Records deliveries; sessions in `gone` refuse them.
    #[derive(Default)]
    struct Recorder {
        delivered: Mutex<Vec<(SessionId, SessionMessage)>>,
        gone: Mutex<HashSet<SessionId>>,
    }

    #[async_trait]
    impl SessionDelivery for Recorder {
        async fn deliver(&self, session_id: &SessionId, message: SessionMessage) -> bool {
            if self.gone.lock().contains(session_id) {
                return false;
            }
            self.delivered.lock().push((session_id.clone(), message));
            true
        }
    }

    fn setup() -> (Arc<FakeGateway>, Arc<SubscriptionRegistry>, Arc<Recorder>, NotificationRouter) {
        let gw = Arc::new(FakeGateway::default());
        let reg = Arc::new(registry(&gw));
        let rec = Arc::new(Recorder::default());
        let router = NotificationRouter::new(Arc::clone(&reg), Arc::clone(&rec) as Arc<dyn SessionDelivery>);
        (gw, reg, rec, router)
    }

    #[tokio::test]
    async fn unknown_subscription_is_dropped() {
        let (_, _, rec, router) = setup();
        let outcome = router.route(&"never".into(), json!({"id": "x"})).await;
        assert_eq!(outcome, RouteOutcome::Dropped);
        assert!(rec.delivered.lock().is_empty());
    }

    #[tokio::test]
    async fn delivers_to_owner_untouched() {
        let (_, reg, rec, router) = setup();
        let a = SessionId::from("A");
        let id = reg
            .register(&a, "", RegisterRequest::entity("room:42"))
            .await
            .unwrap();
        let element = json!({"id": "room:42", "attributes": [{"name": "temperature", "value": "23"}]});

        assert_eq!(router.route(&id, element.clone()).await, RouteOutcome::Delivered);
        let delivered = rec.delivered.lock();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, a);
        assert_eq!(
            delivered[0].1,
            SessionMessage::Notification {
                subscription_id: id,
                element
            }
        );
    }

    #[tokio::test]
    async fn gone_session_is_undeliverable() {
        let (_, reg, rec, router) = setup();
        let a = SessionId::from("A");
        let id = reg
            .register(&a, "", RegisterRequest::entity("room:42"))
            .await
            .unwrap();
        let _ = rec.gone.lock().insert(a);

        assert_eq!(router.route(&id, json!({})).await, RouteOutcome::Undeliverable);
        assert_eq!(reg.len(), 1);
    }

    #[tokio::test]
    async fn subscription_lifecycle_scenario() {
        let (gw, reg, rec, router) = setup();
        let a = SessionId::from("A");
        let req = RegisterRequest {
            attributes: vec!["temperature".into()],
            ..RegisterRequest::entity("room:42")
        };

        let id = reg.register(&a, "client-a", req).await.unwrap();
        assert_eq!(id.as_str(), "sub-1");
        assert_eq!(reg.owner_of(&id), Some(a.clone()));

        assert_eq!(router.route(&id, json!({"id": "room:42"})).await, RouteOutcome::Delivered);
        assert_eq!(rec.delivered.lock()[0].0, a);

        assert!(reg.disconnect(&a).await);
        assert_eq!(reg.owner_of(&id), None);

        assert_eq!(router.route(&id, json!({"id": "room:42"})).await, RouteOutcome::Dropped);
        assert_eq!(rec.delivered.lock().len(), 1);
        assert_eq!(gw.calls(), (1, 1, 1));
    }
}
