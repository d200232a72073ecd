//! Registry types.

use chrono::{DateTime, Utc};
use relay_broker::{EntityDescriptor, SubscribeOptions};
use relay_core::{SessionId, SubscriptionId};
use serde::{Deserialize, Serialize};

/// What a session asks to watch.
///
/// Deserialized from the `subscription` object of a `register` frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    /// Entity id, or a pattern when `is_pattern` is set.
    pub entity_id: String,
    /// Treat `entity_id` as a regular expression.
    pub is_pattern: bool,
    /// Entity type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Attributes included in notifications.
    pub attributes: Vec<String>,
    /// Attributes whose change triggers a notification.
    pub conditions: Vec<String>,
    /// Validity period (ISO-8601 duration).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl RegisterRequest {
    /// Request for a single entity id.
    pub fn entity(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Merge the request with what the broker reported for the entity.
    /// The request's id and pattern flag win; a missing type is filled in.
    pub(crate) fn descriptor(&self, looked_up: EntityDescriptor) -> EntityDescriptor {
        EntityDescriptor {
            id: self.entity_id.clone(),
            entity_type: self.entity_type.clone().or(looked_up.entity_type),
            is_pattern: self.is_pattern,
            access_scope: looked_up.access_scope,
        }
    }

    pub(crate) fn options(&self, default_duration: Option<&str>) -> SubscribeOptions {
        SubscribeOptions {
            attributes: self.attributes.clone(),
            conditions: self.conditions.clone(),
            duration: self
                .duration
                .clone()
                .or_else(|| default_duration.map(String::from)),
        }
    }
}

/// One active broker subscription and its owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Broker-assigned id.
    pub subscription_id: SubscriptionId,
    /// Watched entity id or pattern.
    pub entity_id: String,
    /// Entity type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Whether `entity_id` is a pattern.
    pub is_pattern: bool,
    /// Attributes included in notifications.
    pub attributes: Vec<String>,
    /// Trigger attributes.
    pub conditions: Vec<String>,
    /// Validity period sent to the broker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Session that created the subscription.
    pub owner_session_id: SessionId,
    /// Local registration time.
    pub created_at: DateTime<Utc>,
}
