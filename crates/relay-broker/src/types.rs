//! Gateway input/output types.

use serde::{Deserialize, Serialize};

/// An entity the broker confirmed exists (and the caller may watch).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDescriptor {
    /// Entity id (or id pattern).
    pub id: String,
    /// Entity type, if known.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Whether `id` is a regular expression over entity ids.
    #[serde(default)]
    pub is_pattern: bool,
    /// Value of the broker-side `access:scope` attribute, if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_scope: Option<String>,
}

impl EntityDescriptor {
    /// Whether the entity is marked private on the broker.
    pub fn is_private(&self) -> bool {
        self.access_scope.as_deref() == Some("private")
    }
}

/// What a subscription watches on an entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribeOptions {
    /// Attributes included in notifications.
    pub attributes: Vec<String>,
    /// Attributes whose change triggers a notification.
    pub conditions: Vec<String>,
    /// Validity period (ISO-8601 duration) passed through to the broker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_scope_detection() {
        let mut e = EntityDescriptor {
            id: "urn:oc:entity:x".into(),
            entity_type: None,
            is_pattern: false,
            access_scope: Some("private".into()),
        };
        assert!(e.is_private());
        e.access_scope = Some("public".into());
        assert!(!e.is_private());
        e.access_scope = None;
        assert!(!e.is_private());
    }

    #[test]
    fn options_deserialize_partial() {
        let o: SubscribeOptions = serde_json::from_str(r#"{"attributes":["temperature"]}"#).unwrap();
        assert_eq!(o.attributes, vec!["temperature"]);
        assert!(o.conditions.is_empty());
        assert!(o.duration.is_none());
    }
}
