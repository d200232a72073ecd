//! Upstream service settings: the context broker and the identity provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Context broker connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrokerSettings {
    /// Broker base URL, without trailing path.
    pub url: String,
    /// Externally reachable URL the broker POSTs notifications to.
    /// Identical for every subscription.
    pub callback_url: String,
    /// `Fiware-Service` tenant header.
    pub fiware_service: String,
    /// `Fiware-ServicePath` header.
    pub fiware_service_path: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Duration applied when a client registers without one (e.g. `P1M`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_duration: Option<String>,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:1026".to_string(),
            callback_url: "http://localhost:8090/receiveNotifications".to_string(),
            fiware_service: "organicity".to_string(),
            fiware_service_path: "/".to_string(),
            request_timeout_secs: 30,
            default_duration: None,
        }
    }
}

/// Identity provider settings for the client-credentials grant.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IdentitySettings {
    /// Identity provider base URL.
    pub token_url: String,
    /// Token endpoint path appended to `token_url`.
    pub token_path: String,
    /// OAuth client id of this bridge.
    pub client_id: String,
    /// OAuth client secret of this bridge.
    pub client_secret: String,
    /// Renewal delay used when `expires_in` is missing, malformed, or zero.
    pub default_renewal_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            token_url: String::new(),
            token_path: "/realms/organicity/protocol/openid-connect/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            default_renewal_secs: 200,
            request_timeout_secs: 30,
        }
    }
}

impl IdentitySettings {
    /// Full token endpoint URL.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.token_url.trim_end_matches('/'),
            self.token_path
        )
    }
}

impl fmt::Debug for IdentitySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentitySettings")
            .field("token_url", &self.token_url)
            .field("token_path", &self.token_path)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("default_renewal_secs", &self.default_renewal_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
