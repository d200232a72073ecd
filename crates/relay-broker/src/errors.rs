//! Gateway errors.

/// Outcome of a failed broker call.
///
/// `NotFound` and `AccessDenied` are answers about the entity; `Transport`
/// and `Broker` mean the call itself did not go through and may be retried.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Entity or subscription does not exist on the broker.
    #[error("not found: {id}")]
    NotFound {
        /// Entity or subscription id.
        id: String,
    },
    /// Entity is private and the caller does not own it.
    #[error("access denied to entity {entity_id}")]
    AccessDenied {
        /// Entity id.
        entity_id: String,
    },
    /// Network, TLS, or timeout failure.
    #[error("broker unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// The broker answered but refused or failed the request.
    #[error("broker error (status {status}): {message}")]
    Broker {
        /// HTTP status, or the NGSI status code when reported in the body.
        status: u16,
        /// Reason phrase or body.
        message: String,
    },
}

impl GatewayError {
    /// True for answers that say "you may not watch this entity".
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::AccessDenied { .. })
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AccessDenied { .. } => "access_denied",
            Self::Transport(_) => "transport",
            Self::Broker { .. } => "broker",
        }
    }
}
