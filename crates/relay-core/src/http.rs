//! Shared `reqwest` client construction.
//!
//! Both the identity provider and the broker are reached over HTTP(S) with a
//! finite timeout. Certificate verification is strict unless the caller
//! explicitly opts out; trusting a private CA via a PEM bundle is preferred
//! over disabling verification entirely.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Options for [`build_client`].
#[derive(Clone, Debug)]
pub struct HttpClientOptions {
    /// Per-request timeout (connect + body).
    pub timeout: Duration,
    /// Accept any server certificate. Insecure.
    pub accept_invalid_certs: bool,
    /// Extra PEM-encoded root certificate(s) to trust.
    pub ca_cert_path: Option<PathBuf>,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            ca_cert_path: None,
        }
    }
}

/// HTTP client construction errors.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    /// CA bundle could not be read.
    #[error("failed to read CA bundle at {path}: {reason}")]
    CaRead {
        /// Bundle path.
        path: String,
        /// Error description.
        reason: String,
    },
    /// CA bundle is not valid PEM.
    #[error("failed to parse CA bundle at {path}: {reason}")]
    CaParse {
        /// Bundle path.
        path: String,
        /// Error description.
        reason: String,
    },
    /// `reqwest` rejected the builder configuration.
    #[error("failed to build HTTP client: {reason}")]
    Build {
        /// Error description.
        reason: String,
    },
}

/// Build a `reqwest::Client` honouring the TLS and timeout options.
pub fn build_client(opts: &HttpClientOptions) -> Result<reqwest::Client, HttpClientError> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(opts.timeout)
        .connect_timeout(opts.timeout);

    if let Some(path) = &opts.ca_cert_path {
        let pem = std::fs::read(path).map_err(|e| HttpClientError::CaRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let certs =
            reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| HttpClientError::CaParse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        for cert in certs {
            builder = builder.add_root_certificate(cert);
        }
    }

    if opts.accept_invalid_certs {
        warn!("TLS certificate verification is DISABLED; every server certificate will be accepted");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().map_err(|e| HttpClientError::Build {
        reason: e.to_string(),
    })
}
