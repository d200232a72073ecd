//! Token exchange errors.
//!
//! Every variant is fatal for the bridge; the split exists so logs say why.

/// Identity provider exchange failure.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The provider answered with an `error_description` (bad credentials,
    /// disabled client, unknown realm, ...).
    #[error("identity provider rejected credentials: {description}")]
    Rejected {
        /// Provider-supplied description.
        description: String,
    },
    /// Non-success HTTP status without a structured error body.
    #[error("identity provider returned HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body (possibly empty).
        body: String,
    },
    /// The response was not the JSON shape we expect.
    #[error("malformed token response: {message}")]
    Malformed {
        /// What was wrong.
        message: String,
    },
    /// Network, TLS, or timeout failure.
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AuthError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "rejected",
            Self::Http { .. } => "http",
            Self::Malformed { .. } => "malformed",
            Self::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_description() {
        let e = AuthError::Rejected {
            description: "Invalid client secret".into(),
        };
        assert_eq!(
            e.to_string(),
            "identity provider rejected credentials: Invalid client secret"
        );
        assert_eq!(e.kind(), "rejected");
    }

    #[test]
    fn kinds_are_distinct() {
        let http = AuthError::Http {
            status: 502,
            body: String::new(),
        };
        let malformed = AuthError::Malformed {
            message: "x".into(),
        };
        assert_ne!(http.kind(), malformed.kind());
    }
}
