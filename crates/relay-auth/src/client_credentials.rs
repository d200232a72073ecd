//! OAuth 2.0 client-credentials exchange.
//!
//! `POST {token_endpoint}` with `Authorization: Basic base64(id:secret)` and
//! a form body of `grant_type=client_credentials`. The provider answers with
//! `access_token` + `expires_in`, or with `error_description` on failure.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, info};

use relay_settings::IdentitySettings;

use crate::errors::AuthError;
use crate::types::{IssuedToken, TokenProvider, parse_expires_in};

/// Grant body sent on every exchange.
const GRANT_BODY: &str = "grant_type=client_credentials";

/// Client-credentials token provider backed by `reqwest`.
pub struct ClientCredentialsProvider {
    client: reqwest::Client,
    endpoint: String,
    client_id: String,
    authorization: String,
}

impl std::fmt::Debug for ClientCredentialsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsProvider")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl ClientCredentialsProvider {
    /// Create a provider for an explicit endpoint.
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: &str,
    ) -> Self {
        let client_id = client_id.into();
        let authorization = format!(
            "Basic {}",
            STANDARD.encode(format!("{client_id}:{client_secret}"))
        );
        Self {
            client,
            endpoint: endpoint.into(),
            client_id,
            authorization,
        }
    }

    /// Create a provider from identity settings.
    pub fn from_settings(settings: &IdentitySettings, client: reqwest::Client) -> Self {
        Self::new(
            client,
            settings.token_endpoint(),
            settings.client_id.clone(),
            &settings.client_secret,
        )
    }

    /// Token endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    #[tracing::instrument(skip_all, fields(client_id = %self.client_id))]
    async fn fetch_token(&self) -> Result<IssuedToken, AuthError> {
        debug!(endpoint = %self.endpoint, "requesting client-credentials token");
        let resp = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(GRANT_BODY)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        let issued = parse_token_response(status.as_u16(), &text)?;
        info!(
            expires_in = ?issued.expires_in,
            token = %relay_core::text::redact(&issued.access_token),
            "obtained access token"
        );
        Ok(issued)
    }
}

/// Interpret a token endpoint response.
///
/// `error_description` wins over everything, even on a 2xx status; some
/// providers report credential failures that way.
fn parse_token_response(status: u16, body: &str) -> Result<IssuedToken, AuthError> {
    let json: Option<Value> = serde_json::from_str(body).ok();

    if let Some(desc) = json
        .as_ref()
        .and_then(|v| v.get("error_description"))
        .and_then(Value::as_str)
    {
        return Err(AuthError::Rejected {
            description: desc.to_string(),
        });
    }

    if !(200..300).contains(&status) {
        if let Some(code) = json.as_ref().and_then(|v| v.get("error")).and_then(Value::as_str) {
            return Err(AuthError::Rejected {
                description: code.to_string(),
            });
        }
        return Err(AuthError::Http {
            status,
            body: body.to_string(),
        });
    }

    let json = json.ok_or_else(|| AuthError::Malformed {
        message: "response body is not JSON".into(),
    })?;

    let access_token = json
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::Malformed {
            message: "missing access_token".into(),
        })?
        .to_string();

    let expires_in = json.get("expires_in").and_then(parse_expires_in);

    Ok(IssuedToken {
        access_token,
        expires_in,
    })
}
