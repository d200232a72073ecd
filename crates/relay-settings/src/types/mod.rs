//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a settings file only needs the fields it wants to change.

mod server;
mod upstream;

pub use server::*;
pub use upstream::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the relay bridge.
///
/// # JSON Format
///
/// ```json
/// {
///   "server": { "port": 8090 },
///   "broker": { "url": "https://orion.example.org", "callbackUrl": "https://relay.example.org/receiveNotifications" },
///   "identity": { "tokenUrl": "https://accounts.example.org", "clientId": "relay", "clientSecret": "..." },
///   "tls": { "caCertPath": "/etc/relay/ca.pem" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// HTTP / WebSocket listener settings.
    pub server: ServerSettings,
    /// Context broker connection settings.
    pub broker: BrokerSettings,
    /// Identity provider (client-credentials) settings.
    pub identity: IdentitySettings,
    /// Outbound TLS verification settings.
    pub tls: TlsSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl RelaySettings {
    /// Correct invalid values in place.
    ///
    /// Zero timeouts or a zero renewal fallback would either hang forever or
    /// spin; they are reset to defaults with a warning instead of rejected.
    pub fn validate(&mut self) {
        fn non_zero(val: &mut u64, default: u64, name: &str) {
            if *val == 0 {
                tracing::warn!("{name} must be positive, using {default}");
                *val = default;
            }
        }

        let broker_default = BrokerSettings::default();
        non_zero(
            &mut self.broker.request_timeout_secs,
            broker_default.request_timeout_secs,
            "broker.requestTimeoutSecs",
        );

        let identity_default = IdentitySettings::default();
        non_zero(
            &mut self.identity.request_timeout_secs,
            identity_default.request_timeout_secs,
            "identity.requestTimeoutSecs",
        );
        non_zero(
            &mut self.identity.default_renewal_secs,
            identity_default.default_renewal_secs,
            "identity.defaultRenewalSecs",
        );

        if self.server.session_channel_capacity == 0 {
            let default = ServerSettings::default().session_channel_capacity;
            tracing::warn!("server.sessionChannelCapacity must be positive, using {default}");
            self.server.session_channel_capacity = default;
        }

        if !self.server.notification_path.starts_with('/') {
            self.server.notification_path.insert(0, '/');
        }
        if !self.server.ws_path.starts_with('/') {
            self.server.ws_path.insert(0, '/');
        }

        if self.tls.accept_invalid_certs {
            tracing::warn!(
                "tls.acceptInvalidCerts is enabled: outbound TLS verification is disabled"
            );
        }
    }

    /// Reject settings the bridge cannot start with.
    ///
    /// The bridge is useless without a token, so missing identity
    /// credentials are a hard error rather than a default.
    pub fn require_credentials(&self) -> Result<()> {
        let checks: [(&'static str, &str); 5] = [
            ("identity.tokenUrl", &self.identity.token_url),
            ("identity.clientId", &self.identity.client_id),
            ("identity.clientSecret", &self.identity.client_secret),
            ("broker.url", &self.broker.url),
            ("broker.callbackUrl", &self.broker.callback_url),
        ];
        for (field, value) in checks {
            if value.trim().is_empty() {
                return Err(SettingsError::Invalid {
                    field,
                    reason: "must not be empty".into(),
                });
            }
        }
        Ok(())
    }
}

/// Outbound TLS verification settings.
///
/// Verification is strict by default. The broker deployment this bridge was
/// written for runs a self-issued CA; point `caCertPath` at it instead of
/// turning verification off.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TlsSettings {
    /// INSECURE: accept any server certificate.
    pub accept_invalid_certs: bool,
    /// PEM bundle with additional trusted root certificates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Emit JSON log lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
