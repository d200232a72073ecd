//! Orion context broker gateway over `reqwest`.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, warn};

use relay_core::SubscriptionId;
use relay_settings::BrokerSettings;

use crate::errors::GatewayError;
use crate::gateway::BrokerGateway;
use crate::ngsi::{
    EntityRef, NotifyCondition, ON_CHANGE, SubscribeContextRequest, SubscribeContextResponse,
    UnsubscribeContextRequest, UnsubscribeContextResponse,
};
use crate::types::{EntityDescriptor, SubscribeOptions};

/// Characters escaped when an entity id is used as a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Attribute carrying the broker-side visibility of an entity.
const ACCESS_SCOPE_ATTR: &str = "access:scope";

/// Connection settings for [`OrionGateway`].
#[derive(Clone, Debug)]
pub struct OrionConfig {
    /// Broker base URL.
    pub base_url: String,
    /// Notification callback URL registered with every subscription.
    pub callback_url: String,
    /// `Fiware-Service` header value.
    pub fiware_service: String,
    /// `Fiware-ServicePath` header value.
    pub fiware_service_path: String,
}

impl From<&BrokerSettings> for OrionConfig {
    fn from(s: &BrokerSettings) -> Self {
        Self {
            base_url: s.url.trim_end_matches('/').to_string(),
            callback_url: s.callback_url.clone(),
            fiware_service: s.fiware_service.clone(),
            fiware_service_path: s.fiware_service_path.clone(),
        }
    }
}

/// [`BrokerGateway`] for an Orion broker.
pub struct OrionGateway {
    config: OrionConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for OrionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrionGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OrionGateway {
    /// Create a gateway. `client` carries the timeout and TLS policy.
    pub fn new(config: OrionConfig, client: reqwest::Client) -> Self {
        info!(
            broker = %config.base_url,
            callback = %config.callback_url,
            service = %config.fiware_service,
            "broker gateway initialized"
        );
        Self { config, client }
    }

    /// Callback URL every subscription notifies.
    pub fn callback_url(&self) -> &str {
        &self.config.callback_url
    }

    fn headers(&self, token: &str) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let _ = headers.insert("fiware-service", header_value(&self.config.fiware_service)?);
        let _ = headers.insert(
            "fiware-servicepath",
            header_value(&self.config.fiware_service_path)?,
        );
        if !token.is_empty() {
            let _ = headers.insert("x-auth-token", header_value(token)?);
        }
        Ok(headers)
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(raw).map_err(|e| GatewayError::Broker {
        status: 0,
        message: format!("invalid header value: {e}"),
    })
}

/// Read a response body as JSON, tolerating an empty or non-JSON body.
async fn read_json(resp: reqwest::Response) -> Result<(u16, Value), GatewayError> {
    let status = resp.status().as_u16();
    let text = resp.text().await?;
    let json = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    Ok((status, json))
}

/// Apply the visibility rule to a looked-up entity.
///
/// The broker does not filter private entities per client, so the bridge
/// does: a private entity is only visible when the caller's client id occurs
/// in the entity id. An empty client id occurs in every id.
fn check_access(entity: &EntityDescriptor, client_id: &str) -> Result<(), GatewayError> {
    if entity.is_private() && !entity.id.contains(client_id) {
        return Err(GatewayError::AccessDenied {
            entity_id: entity.id.clone(),
        });
    }
    Ok(())
}

fn describe_entity(entity_id: &str, body: &Value) -> EntityDescriptor {
    EntityDescriptor {
        id: body
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(entity_id)
            .to_string(),
        entity_type: body.get("type").and_then(Value::as_str).map(String::from),
        is_pattern: false,
        access_scope: body
            .get(ACCESS_SCOPE_ATTR)
            .and_then(|attr| attr.get("value"))
            .and_then(Value::as_str)
            .map(String::from),
    }
}

#[async_trait]
impl BrokerGateway for OrionGateway {
    #[tracing::instrument(skip_all, fields(entity_id = %entity_id))]
    async fn lookup_entity(
        &self,
        entity_id: &str,
        client_id: &str,
        token: &str,
    ) -> Result<EntityDescriptor, GatewayError> {
        let url = format!(
            "{}/v2/entities/{}",
            self.config.base_url,
            utf8_percent_encode(entity_id, PATH_SEGMENT)
        );
        let resp = self
            .client
            .get(&url)
            .headers(self.headers(token)?)
            .send()
            .await?;
        let (status, body) = read_json(resp).await?;

        if body.get("error").is_some() || status == 404 {
            info!(entity_id, status, "client tried to access unknown entity");
            return Err(GatewayError::NotFound {
                id: entity_id.to_string(),
            });
        }
        if !(200..300).contains(&status) {
            warn!(entity_id, status, "entity lookup failed");
            return Err(GatewayError::Broker {
                status,
                message: body.to_string(),
            });
        }

        let entity = describe_entity(entity_id, &body);
        if let Err(e) = check_access(&entity, client_id) {
            info!(entity_id, client_id, "client tried to access private entity");
            return Err(e);
        }
        debug!(entity_id, entity_type = ?entity.entity_type, "entity resolved");
        Ok(entity)
    }

    #[tracing::instrument(skip_all, fields(entity_id = %entity.id))]
    async fn create_subscription(
        &self,
        entity: &EntityDescriptor,
        options: &SubscribeOptions,
        token: &str,
    ) -> Result<SubscriptionId, GatewayError> {
        let body = SubscribeContextRequest {
            entities: vec![EntityRef {
                entity_type: entity.entity_type.as_deref(),
                is_pattern: if entity.is_pattern { "true" } else { "false" },
                id: &entity.id,
            }],
            attributes: &options.attributes,
            reference: &self.config.callback_url,
            duration: options.duration.as_deref(),
            notify_conditions: vec![NotifyCondition {
                kind: ON_CHANGE,
                cond_values: &options.conditions,
            }],
        };

        let url = format!("{}/v1/subscribeContext", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(self.headers(token)?)
            .json(&body)
            .send()
            .await?;
        let (status, json) = read_json(resp).await?;

        let parsed: SubscribeContextResponse =
            serde_json::from_value(json.clone()).unwrap_or_default();
        if let Some(err) = parsed.subscribe_error {
            warn!(status, code = ?err.error_code.code(), reason = %err.error_code.describe(), "broker refused subscription");
            return Err(GatewayError::Broker {
                status: err.error_code.code().unwrap_or(status),
                message: err.error_code.describe(),
            });
        }
        match parsed.subscribe_response {
            Some(ok) if (200..300).contains(&status) && !ok.subscription_id.is_empty() => {
                info!(subscription_id = %ok.subscription_id, duration = ?ok.duration, "subscription created");
                Ok(SubscriptionId::new(ok.subscription_id))
            }
            _ => {
                warn!(status, body = %json, "unexpected subscribe response");
                Err(GatewayError::Broker {
                    status,
                    message: json.to_string(),
                })
            }
        }
    }

    #[tracing::instrument(skip_all, fields(subscription_id = %subscription_id))]
    async fn delete_subscription(
        &self,
        subscription_id: &SubscriptionId,
        token: &str,
    ) -> Result<(), GatewayError> {
        info!("sending request to remove subscription");
        let url = format!("{}/v1/unsubscribeContext", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .headers(self.headers(token)?)
            .json(&UnsubscribeContextRequest {
                subscription_id: subscription_id.as_str(),
            })
            .send()
            .await?;
        let (status, json) = read_json(resp).await?;

        let parsed: UnsubscribeContextResponse =
            serde_json::from_value(json.clone()).unwrap_or_default();
        let ngsi_status = parsed
            .status_code
            .as_ref()
            .or(parsed.subscribe_error.as_ref().map(|e| &e.error_code));
        let code = ngsi_status.and_then(crate::ngsi::StatusCode::code).unwrap_or(status);

        match code {
            200..=299 if (200..300).contains(&status) => Ok(()),
            404 => {
                warn!("broker does not know subscription");
                Err(GatewayError::NotFound {
                    id: subscription_id.to_string(),
                })
            }
            _ => {
                let message = ngsi_status.map_or_else(|| json.to_string(), crate::ngsi::StatusCode::describe);
                warn!(status, code, %message, "error while unsubscribing");
                Err(GatewayError::Broker {
                    status: code,
                    message,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CALLBACK: &str = "http://relay.test/receiveNotifications";

    fn gateway(server: &MockServer) -> OrionGateway {
        OrionGateway::new(
            OrionConfig {
                base_url: server.uri(),
                callback_url: CALLBACK.into(),
                fiware_service: "organicity".into(),
                fiware_service_path: "/".into(),
            },
            reqwest::Client::new(),
        )
    }

    fn entity(id: &str) -> EntityDescriptor {
        EntityDescriptor {
            id: id.into(),
            entity_type: Some("Room".into()),
            is_pattern: false,
            access_scope: None,
        }
    }

    // ── lookup_entity ────────────────────────────────────────────────────

    #[tokio::test]
    async fn lookup_public_entity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/entities/room:42"))
            .and(header("fiware-service", "organicity"))
            .and(header("fiware-servicepath", "/"))
            .and(header("x-auth-token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "room:42",
                "type": "Room",
                "temperature": {"type": "Number", "value": 21.5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let e = gateway(&server)
            .lookup_entity("room:42", "client-a", "tok")
            .await
            .unwrap();
        assert_eq!(e.id, "room:42");
        assert_eq!(e.entity_type.as_deref(), Some("Room"));
        assert!(!e.is_private());
    }

    #[tokio::test]
    async fn lookup_error_body_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "NotFound",
                "description": "The requested entity has not been found. Check type and id"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .lookup_entity("room:404", "c", "tok")
            .await
            .unwrap_err();
        assert_matches!(err, GatewayError::NotFound { ref id } if id == "room:404");
    }

    #[tokio::test]
    async fn lookup_error_field_on_200_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "gone"})))
            .mount(&server)
            .await;

        assert_matches!(
            gateway(&server).lookup_entity("x", "c", "tok").await,
            Err(GatewayError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn lookup_private_entity_of_other_client_is_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "urn:oc:entity:client-b:sensor1",
                "type": "Sensor",
                "access:scope": {"type": "urn:oc:attributeType:accessScope", "value": "private"}
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .lookup_entity("urn:oc:entity:client-b:sensor1", "client-a", "tok")
            .await
            .unwrap_err();
        assert_matches!(err, GatewayError::AccessDenied { .. });
    }

    #[tokio::test]
    async fn lookup_private_entity_of_own_client_is_allowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "urn:oc:entity:client-a:sensor1",
                "type": "Sensor",
                "access:scope": {"value": "private"}
            })))
            .mount(&server)
            .await;

        let e = gateway(&server)
            .lookup_entity("urn:oc:entity:client-a:sensor1", "client-a", "tok")
            .await
            .unwrap();
        assert!(e.is_private());
    }

    #[tokio::test]
    async fn lookup_server_error_is_broker_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        assert_matches!(
            gateway(&server).lookup_entity("x", "c", "tok").await,
            Err(GatewayError::Broker { status: 500, .. })
        );
    }

    #[tokio::test]
    async fn lookup_encodes_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/entities/a%2Fb%20c"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a/b c"})))
            .expect(1)
            .mount(&server)
            .await;

        let e = gateway(&server).lookup_entity("a/b c", "c", "tok").await.unwrap();
        assert_eq!(e.id, "a/b c");
    }

    #[test]
    fn empty_client_id_sees_private() {
        let mut e = entity("urn:oc:entity:anything");
        e.access_scope = Some("private".into());
        assert!(check_access(&e, "").is_ok());
        assert_matches!(check_access(&e, "other"), Err(GatewayError::AccessDenied { .. }));
    }

    // ── create_subscription ──────────────────────────────────────────────

    #[tokio::test]
    async fn create_subscription_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/subscribeContext"))
            .and(header("x-auth-token", "tok"))
            .and(body_json(json!({
                "entities": [{"type": "Room", "isPattern": "false", "id": "room:42"}],
                "attributes": ["temperature"],
                "reference": CALLBACK,
                "duration": "P1M",
                "notifyConditions": [{"type": "ONCHANGE", "condValues": ["pressure"]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscribeResponse": {"subscriptionId": "sub-1", "duration": "P1M"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let opts = SubscribeOptions {
            attributes: vec!["temperature".into()],
            conditions: vec!["pressure".into()],
            duration: Some("P1M".into()),
        };
        let id = gateway(&server)
            .create_subscription(&entity("room:42"), &opts, "tok")
            .await
            .unwrap();
        assert_eq!(id.as_str(), "sub-1");
    }

    #[tokio::test]
    async fn create_subscription_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/subscribeContext"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscribeError": {"errorCode": {"code": "400", "reasonPhrase": "Bad Request", "details": "invalid duration"}}
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .create_subscription(&entity("room:42"), &SubscribeOptions::default(), "tok")
            .await
            .unwrap_err();
        assert_matches!(err, GatewayError::Broker { status: 400, ref message } if message == "Bad Request: invalid duration");
    }

    #[tokio::test]
    async fn create_subscription_garbage_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        assert_matches!(
            gateway(&server)
                .create_subscription(&entity("room:42"), &SubscribeOptions::default(), "tok")
                .await,
            Err(GatewayError::Broker { status: 502, .. })
        );
    }

    #[tokio::test]
    async fn create_subscription_unreachable() {
        let server = MockServer::start().await;
        let gw = gateway(&server);
        drop(server);
        assert_matches!(
            gw.create_subscription(&entity("room:42"), &SubscribeOptions::default(), "tok")
                .await,
            Err(GatewayError::Transport(_))
        );
    }

    // ── delete_subscription ──────────────────────────────────────────────

    #[tokio::test]
    async fn delete_subscription_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/unsubscribeContext"))
            .and(body_json(json!({"subscriptionId": "sub-1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscriptionId": "sub-1",
                "statusCode": {"code": "200", "reasonPhrase": "OK"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        gateway(&server)
            .delete_subscription(&SubscriptionId::from("sub-1"), "tok")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_unknown_subscription_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/unsubscribeContext"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscriptionId": "sub-9",
                "statusCode": {"code": "404", "reasonPhrase": "No context element found"}
            })))
            .mount(&server)
            .await;

        assert_matches!(
            gateway(&server)
                .delete_subscription(&SubscriptionId::from("sub-9"), "tok")
                .await,
            Err(GatewayError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn delete_with_subscribe_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscribeError": {"subscriptionId": "sub-1", "errorCode": {"code": "500", "reasonPhrase": "Internal Server Error"}}
            })))
            .mount(&server)
            .await;

        assert_matches!(
            gateway(&server)
                .delete_subscription(&SubscriptionId::from("sub-1"), "tok")
                .await,
            Err(GatewayError::Broker { status: 500, .. })
        );
    }

    #[tokio::test]
    async fn delete_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert_matches!(
            gateway(&server)
                .delete_subscription(&SubscriptionId::from("sub-1"), "tok")
                .await,
            Err(GatewayError::Broker { status: 503, .. })
        );
    }

    #[test]
    fn config_from_settings_trims_trailing_slash() {
        let s = BrokerSettings {
            url: "https://orion.example.org/".into(),
            ..BrokerSettings::default()
        };
        let c = OrionConfig::from(&s);
        assert_eq!(c.base_url, "https://orion.example.org");
        assert_eq!(c.callback_url, s.callback_url);
    }
}
