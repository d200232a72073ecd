//! The broker gateway trait.

use async_trait::async_trait;
use relay_core::SubscriptionId;

use crate::errors::GatewayError;
use crate::types::{EntityDescriptor, SubscribeOptions};

/// Broker operations used by the subscription registry.
///
/// Implementations are stateless apart from connection settings; `token` is
/// the bearer token current at call time.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// Resolve an entity and check the caller may watch it.
    ///
    /// `client_id` identifies the requesting client for the private-entity
    /// ownership check.
    async fn lookup_entity(
        &self,
        entity_id: &str,
        client_id: &str,
        token: &str,
    ) -> Result<EntityDescriptor, GatewayError>;

    /// Create a change subscription that notifies this bridge's callback URL.
    async fn create_subscription(
        &self,
        entity: &EntityDescriptor,
        options: &SubscribeOptions,
        token: &str,
    ) -> Result<SubscriptionId, GatewayError>;

    /// Remove a subscription from the broker.
    async fn delete_subscription(
        &self,
        subscription_id: &SubscriptionId,
        token: &str,
    ) -> Result<(), GatewayError>;
}
