//! Registry errors.

use relay_broker::GatewayError;

/// Why the broker refused to let a session watch an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DenialReason {
    /// The entity does not exist.
    #[error("entity not found")]
    NotFound,
    /// The entity is private to another client.
    #[error("access denied")]
    AccessDenied,
}

/// A failed `register`.
#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    /// Definitive answer about the entity; retrying will not help.
    #[error("{0}")]
    Denied(DenialReason),
    /// The broker could not be reached or failed the request.
    #[error("broker unavailable: {message}")]
    Transient {
        /// Underlying gateway error.
        message: String,
    },
}

impl RegisterError {
    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Denied(DenialReason::NotFound) => "not_found",
            Self::Denied(DenialReason::AccessDenied) => "access_denied",
            Self::Transient { .. } => "transient",
        }
    }
}

impl From<GatewayError> for RegisterError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound { .. } => Self::Denied(DenialReason::NotFound),
            GatewayError::AccessDenied { .. } => Self::Denied(DenialReason::AccessDenied),
            other => Self::Transient {
                message: other.to_string(),
            },
        }
    }
}

/// A failed `unregister`. The subscription stays registered locally.
#[derive(Debug, thiserror::Error)]
pub enum UnregisterError {
    /// The broker does not know the subscription.
    #[error("subscription {id} not found")]
    NotFound {
        /// Subscription id.
        id: String,
    },
    /// The broker could not be reached or failed the request.
    #[error("failed to remove subscription {id}: {message}")]
    Transient {
        /// Subscription id.
        id: String,
        /// Underlying gateway error.
        message: String,
    },
}

impl UnregisterError {
    /// Metrics label.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Transient { .. } => "transient",
        }
    }
}
