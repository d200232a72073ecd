//! Subscription registry: who owns which broker subscription.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use relay_auth::TokenSource;
use relay_broker::{BrokerGateway, GatewayError};
use relay_core::metric_names::{
    RELAY_REGISTER_TOTAL, RELAY_SUBSCRIPTIONS_ACTIVE, RELAY_UNREGISTER_TOTAL,
};
use relay_core::{SessionId, SubscriptionId};
use tracing::{debug, info, instrument, warn};

use crate::errors::{RegisterError, UnregisterError};
use crate::types::{RegisterRequest, Subscription};

/// Subscription map plus the reverse session index.
///
/// Every id in `sessions` is a key of `subscriptions` whose owner is the
/// indexing session, and appears under exactly one session. Sessions with no
/// subscriptions have no entry.
#[derive(Default)]
struct RegistryState {
    subscriptions: HashMap<SubscriptionId, Subscription>,
    sessions: HashMap<SessionId, Vec<SubscriptionId>>,
}

impl RegistryState {
    /// Insert unless the id is already present. Returns whether it was added.
    fn insert(&mut self, subscription: Subscription) -> bool {
        if self
            .subscriptions
            .contains_key(&subscription.subscription_id)
        {
            return false;
        }
        self.sessions
            .entry(subscription.owner_session_id.clone())
            .or_default()
            .push(subscription.subscription_id.clone());
        let _ = self
            .subscriptions
            .insert(subscription.subscription_id.clone(), subscription);
        true
    }

    fn remove(&mut self, id: &SubscriptionId) -> Option<Subscription> {
        let subscription = self.subscriptions.remove(id)?;
        if let Some(ids) = self.sessions.get_mut(&subscription.owner_session_id) {
            ids.retain(|owned| owned != id);
            if ids.is_empty() {
                let _ = self.sessions.remove(&subscription.owner_session_id);
            }
        }
        Some(subscription)
    }

    /// Drop a session's index entry and every subscription still listed in it.
    fn evict_session(&mut self, session_id: &SessionId) -> Vec<Subscription> {
        let ids = self.sessions.remove(session_id).unwrap_or_default();
        ids.iter()
            .filter_map(|id| self.subscriptions.remove(id))
            .collect()
    }

    fn publish_gauge(&self) {
        gauge!(RELAY_SUBSCRIPTIONS_ACTIVE).set(self.subscriptions.len() as f64);
    }
}

/// Owns all subscription state and keeps it in step with the broker.
///
/// Broker calls happen outside the lock; local state changes only after the
/// broker confirmed them.
pub struct SubscriptionRegistry {
    gateway: Arc<dyn BrokerGateway>,
    tokens: Arc<dyn TokenSource>,
    default_duration: Option<String>,
    state: Mutex<RegistryState>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new(gateway: Arc<dyn BrokerGateway>, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            gateway,
            tokens,
            default_duration: None,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Duration sent to the broker when a request names none.
    #[must_use]
    pub fn with_default_duration(mut self, duration: Option<String>) -> Self {
        self.default_duration = duration;
        self
    }

    /// Create a broker subscription for `session_id` and record it.
    ///
    /// The entity is looked up first; a denial returns before any
    /// subscription is created. If the broker hands back an id that is
    /// already registered, the existing owner is kept.
    #[instrument(skip_all, fields(session_id = %session_id, entity_id = %request.entity_id))]
    pub async fn register(
        &self,
        session_id: &SessionId,
        client_id: &str,
        request: RegisterRequest,
    ) -> Result<SubscriptionId, RegisterError> {
        let result = self.try_register(session_id, client_id, &request).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome(),
        };
        counter!(RELAY_REGISTER_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    async fn try_register(
        &self,
        session_id: &SessionId,
        client_id: &str,
        request: &RegisterRequest,
    ) -> Result<SubscriptionId, RegisterError> {
        let token = self.tokens.current_token();

        let looked_up = self
            .gateway
            .lookup_entity(&request.entity_id, client_id, &token)
            .await
            .map_err(|e| {
                info!(error = %e, "entity lookup refused");
                RegisterError::from(e)
            })?;
        let entity = request.descriptor(looked_up);
        let options = request.options(self.default_duration.as_deref());

        let subscription_id = self
            .gateway
            .create_subscription(&entity, &options, &token)
            .await
            .map_err(|e| {
                warn!(error = %e, "broker subscription failed");
                RegisterError::Transient {
                    message: e.to_string(),
                }
            })?;

        let subscription = Subscription {
            subscription_id: subscription_id.clone(),
            entity_id: entity.id,
            entity_type: entity.entity_type,
            is_pattern: entity.is_pattern,
            attributes: options.attributes,
            conditions: options.conditions,
            duration: options.duration,
            owner_session_id: session_id.clone(),
            created_at: Utc::now(),
        };

        let existing_owner = {
            let mut state = self.state.lock();
            let owner = if state.insert(subscription) {
                None
            } else {
                state
                    .subscriptions
                    .get(&subscription_id)
                    .map(|s| s.owner_session_id.clone())
            };
            state.publish_gauge();
            owner
        };

        match existing_owner {
            None => info!(subscription_id = %subscription_id, "subscription registered"),
            Some(owner) => warn!(
                subscription_id = %subscription_id,
                existing_owner = %owner,
                "broker returned an id that is already registered; keeping existing owner"
            ),
        }
        Ok(subscription_id)
    }

    /// Remove a subscription from the broker, then locally.
    ///
    /// Any session may remove any subscription; a request from a session
    /// other than the owner is logged. On failure nothing changes locally.
    #[instrument(skip_all, fields(subscription_id = %subscription_id, session_id = %requesting_session))]
    pub async fn unregister(
        &self,
        subscription_id: &SubscriptionId,
        requesting_session: &SessionId,
    ) -> Result<SubscriptionId, UnregisterError> {
        if let Some(owner) = self
            .owner_of(subscription_id)
            .filter(|owner| owner != requesting_session)
        {
            warn!(owner = %owner, "session removing a subscription it does not own");
        }

        let token = self.tokens.current_token();
        let result = match self
            .gateway
            .delete_subscription(subscription_id, &token)
            .await
        {
            Ok(()) => {
                let mut state = self.state.lock();
                let removed = state.remove(subscription_id);
                state.publish_gauge();
                drop(state);
                if removed.is_none() {
                    debug!("broker removed a subscription unknown to this bridge");
                }
                info!("subscription removed");
                Ok(subscription_id.clone())
            }
            Err(GatewayError::NotFound { .. }) => Err(UnregisterError::NotFound {
                id: subscription_id.to_string(),
            }),
            Err(e) => Err(UnregisterError::Transient {
                id: subscription_id.to_string(),
                message: e.to_string(),
            }),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => {
                warn!(error = %e, "unregister failed");
                e.outcome()
            }
        };
        counter!(RELAY_UNREGISTER_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    /// Owner of a subscription, if it is registered.
    pub fn owner_of(&self, subscription_id: &SubscriptionId) -> Option<SessionId> {
        self.state
            .lock()
            .subscriptions
            .get(subscription_id)
            .map(|s| s.owner_session_id.clone())
    }

    /// Tear down everything a session owns.
    ///
    /// Returns `true` only if every broker removal succeeded. The session's
    /// local state is dropped either way; subscriptions the broker failed to
    /// remove are logged as leaked.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn disconnect(&self, session_id: &SessionId) -> bool {
        let owned = self.subscriptions_of(session_id);
        if owned.is_empty() {
            return true;
        }

        let mut all_removed = true;
        for id in &owned {
            if self.unregister(id, session_id).await.is_err() {
                all_removed = false;
            }
        }

        let leaked = {
            let mut state = self.state.lock();
            let leaked = state.evict_session(session_id);
            state.publish_gauge();
            leaked
        };
        for subscription in &leaked {
            warn!(
                subscription_id = %subscription.subscription_id,
                entity_id = %subscription.entity_id,
                "subscription leaked on broker after disconnect"
            );
        }

        info!(
            subscriptions = owned.len(),
            leaked = leaked.len(),
            success = all_removed,
            "session disconnected"
        );
        all_removed
    }

    /// Disconnect every session that owns subscriptions. Used on shutdown.
    pub async fn disconnect_all(&self) -> bool {
        let sessions: Vec<SessionId> = self.state.lock().sessions.keys().cloned().collect();
        if sessions.is_empty() {
            return true;
        }
        info!(sessions = sessions.len(), "disconnecting all sessions");
        let results =
            futures::future::join_all(sessions.iter().map(|s| self.disconnect(s))).await;
        results.into_iter().all(|ok| ok)
    }

    /// Ids owned by a session, in registration order.
    pub fn subscriptions_of(&self, session_id: &SessionId) -> Vec<SubscriptionId> {
        self.state
            .lock()
            .sessions
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// All subscriptions, oldest first.
    pub fn snapshot(&self) -> Vec<Subscription> {
        let mut all: Vec<Subscription> =
            self.state.lock().subscriptions.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.subscription_id.cmp(&b.subscription_id))
        });
        all
    }

    /// Number of registered subscriptions.
    pub fn len(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// Whether no subscriptions are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of sessions owning at least one subscription.
    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }
}
