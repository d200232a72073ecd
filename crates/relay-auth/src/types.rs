//! Token types and the renewal schedule.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AuthError;

/// A freshly issued access token.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Bearer token value.
    pub access_token: String,
    /// Lifetime in seconds as reported by the provider, if usable.
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &relay_core::text::redact(&self.access_token))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Source of new tokens (the identity provider, or a fake in tests).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Perform one exchange.
    async fn fetch_token(&self) -> Result<IssuedToken, AuthError>;
}

/// Interpret an `expires_in` JSON value.
///
/// Accepts a non-negative integer or a string holding one. Anything else
/// (floats, negatives, garbage) is `None`.
pub fn parse_expires_in(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Delay until the next renewal.
///
/// A missing or zero lifetime would otherwise schedule an immediate renewal
/// and spin; both fall back to `fallback`.
pub fn renewal_delay(expires_in: Option<u64>, fallback: Duration) -> Duration {
    match expires_in {
        Some(secs) if secs > 0 => Duration::from_secs(secs),
        _ => fallback,
    }
}
