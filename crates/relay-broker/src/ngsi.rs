//! NGSI wire bodies.
//!
//! Subscription management uses the NGSI v1 `subscribeContext` /
//! `unsubscribeContext` operations; the broker's push notifications arrive as
//! `notifyContextRequest` payloads. Status codes are strings on the wire in
//! most broker versions and numbers in some, so [`StatusCode::code`] accepts
//! both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `ONCHANGE` is the only notify condition the bridge issues.
pub const ON_CHANGE: &str = "ONCHANGE";

/// `POST /v1/subscribeContext` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeContextRequest<'a> {
    /// Watched entities (always exactly one).
    pub entities: Vec<EntityRef<'a>>,
    /// Attributes included in notifications; empty means all.
    pub attributes: &'a [String],
    /// Callback URL the broker notifies.
    pub reference: &'a str,
    /// Validity period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<&'a str>,
    /// Trigger conditions.
    pub notify_conditions: Vec<NotifyCondition<'a>>,
}

/// Entity reference inside a subscribe request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef<'a> {
    /// Entity type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<&'a str>,
    /// `"true"` / `"false"`: NGSI v1 encodes this flag as a string.
    pub is_pattern: &'static str,
    /// Entity id or pattern.
    pub id: &'a str,
}

/// Notify condition inside a subscribe request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyCondition<'a> {
    /// Condition type, see [`ON_CHANGE`].
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Attributes whose change fires the condition.
    pub cond_values: &'a [String],
}

/// `subscribeContext` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscribeContextResponse {
    /// Present on success.
    pub subscribe_response: Option<SubscribeResponse>,
    /// Present on failure.
    pub subscribe_error: Option<SubscribeError>,
}

/// Successful subscribe payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponse {
    /// Broker-assigned id.
    pub subscription_id: String,
    /// Granted duration.
    #[serde(default)]
    pub duration: Option<String>,
}

/// Failed subscribe/unsubscribe payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeError {
    /// Subscription id, when the failure concerns an existing one.
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Error status.
    pub error_code: StatusCode,
}

/// `POST /v1/unsubscribeContext` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsubscribeContextRequest<'a> {
    /// Subscription to remove.
    pub subscription_id: &'a str,
}

/// `unsubscribeContext` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnsubscribeContextResponse {
    /// Echoed subscription id.
    pub subscription_id: Option<String>,
    /// Operation status.
    pub status_code: Option<StatusCode>,
    /// Failure payload used by some broker versions instead of `statusCode`.
    pub subscribe_error: Option<SubscribeError>,
}

/// NGSI status code object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCode {
    /// Numeric code, as string or number.
    pub code: Value,
    /// Human-readable reason.
    #[serde(default)]
    pub reason_phrase: Option<String>,
    /// Additional details.
    #[serde(default)]
    pub details: Option<String>,
}

impl StatusCode {
    /// Numeric value of `code`, if it is one.
    pub fn code(&self) -> Option<u16> {
        match &self.code {
            Value::Number(n) => n.as_u64().and_then(|c| u16::try_from(c).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Reason phrase and details joined for logs and error messages.
    pub fn describe(&self) -> String {
        match (&self.reason_phrase, &self.details) {
            (Some(r), Some(d)) => format!("{r}: {d}"),
            (Some(r), None) => r.clone(),
            (None, Some(d)) => d.clone(),
            (None, None) => "no reason given".to_string(),
        }
    }
}

/// Broker push notification (`notifyContextRequest`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyContextRequest {
    /// Subscription the notification belongs to.
    pub subscription_id: String,
    /// Broker identity.
    #[serde(default)]
    pub originator: Option<String>,
    /// Changed entities; the bridge forwards the first.
    #[serde(default)]
    pub context_responses: Vec<ContextResponse>,
}

/// One entry of `contextResponses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextResponse {
    /// The changed entity, passed through opaquely.
    pub context_element: Value,
    /// Per-element status.
    #[serde(default)]
    pub status_code: Option<StatusCode>,
}

impl NotifyContextRequest {
    /// The first changed element, if any.
    pub fn first_element(&self) -> Option<&Value> {
        self.context_responses.first().map(|r| &r.context_element)
    }
}
