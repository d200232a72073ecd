//! Token lifecycle: hold the current token, renew it on schedule.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::counter;
use parking_lot::RwLock;
use relay_core::metric_names::AUTH_REFRESH_TOTAL;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::errors::AuthError;
use crate::types::{IssuedToken, TokenProvider, renewal_delay};

/// Read-only access to the current bearer token.
pub trait TokenSource: Send + Sync {
    /// Latest valid token. Never blocks on I/O.
    fn current_token(&self) -> Arc<str>;
}

/// A fixed token, for tests and for brokers without authentication.
#[derive(Clone, Debug)]
pub struct StaticToken(Arc<str>);

impl StaticToken {
    /// Wrap a token value.
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }
}

impl TokenSource for StaticToken {
    fn current_token(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

/// Snapshot of the token and when it is due for renewal.
struct TokenState {
    token: Arc<str>,
    renew_at: Instant,
}

/// Join handle of the renewal task.
///
/// Resolves to `Ok(())` when cancelled, or to the fatal [`AuthError`] that
/// stopped renewal.
pub type RenewalHandle = JoinHandle<Result<(), AuthError>>;

/// Owns the bridge's access token.
///
/// The state is replaced wholesale on each renewal, so readers observe either
/// the previous token or the new one. Only the single renewal task writes.
pub struct TokenManager {
    state: RwLock<Arc<TokenState>>,
    renewals: AtomicU64,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("renewals", &self.renewal_count())
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    fn with_token(token: String, delay: Duration) -> Self {
        Self {
            state: RwLock::new(Arc::new(TokenState {
                token: Arc::from(token),
                renew_at: Instant::now() + delay,
            })),
            renewals: AtomicU64::new(0),
        }
    }

    /// Obtain the initial token and spawn the renewal task.
    ///
    /// The initial exchange is awaited: if it fails the error is returned
    /// and nothing is spawned. `fallback` is the renewal delay used when the
    /// provider reports no usable `expires_in`.
    #[instrument(skip_all)]
    pub async fn start(
        provider: Arc<dyn TokenProvider>,
        fallback: Duration,
        cancel: CancellationToken,
    ) -> Result<(Arc<Self>, RenewalHandle), AuthError> {
        let issued = provider.fetch_token().await.inspect_err(|e| {
            counter!(AUTH_REFRESH_TOTAL, "status" => "failure").increment(1);
            error!(error = %e, kind = e.kind(), "initial token exchange failed");
        })?;
        counter!(AUTH_REFRESH_TOTAL, "status" => "success").increment(1);

        let delay = renewal_delay(issued.expires_in, fallback);
        let manager = Arc::new(Self::with_token(issued.access_token, delay));
        info!(next_renewal_secs = delay.as_secs(), "token manager started");

        let task = Arc::clone(&manager).run_renewals(provider, fallback, delay, cancel);
        Ok((manager, tokio::spawn(task)))
    }

    async fn run_renewals(
        self: Arc<Self>,
        provider: Arc<dyn TokenProvider>,
        fallback: Duration,
        mut delay: Duration,
        cancel: CancellationToken,
    ) -> Result<(), AuthError> {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("token renewal stopped");
                    return Ok(());
                }
                () = tokio::time::sleep(delay) => {}
            }

            let result = tokio::select! {
                () = cancel.cancelled() => {
                    info!("token renewal stopped mid-exchange");
                    return Ok(());
                }
                r = provider.fetch_token() => r,
            };

            match result {
                Ok(issued) => {
                    delay = renewal_delay(issued.expires_in, fallback);
                    self.replace(issued, delay);
                    counter!(AUTH_REFRESH_TOTAL, "status" => "success").increment(1);
                    info!(
                        renewals = self.renewal_count(),
                        next_renewal_secs = delay.as_secs(),
                        "updated token from identity provider"
                    );
                }
                Err(e) => {
                    counter!(AUTH_REFRESH_TOTAL, "status" => "failure").increment(1);
                    error!(error = %e, kind = e.kind(), "token renewal failed; bridge cannot stay authenticated");
                    return Err(e);
                }
            }
        }
    }

    fn replace(&self, issued: IssuedToken, delay: Duration) {
        let next = Arc::new(TokenState {
            token: Arc::from(issued.access_token),
            renew_at: Instant::now() + delay,
        });
        *self.state.write() = next;
        let _ = self.renewals.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of successful renewals since start (the initial exchange is
    /// not counted).
    pub fn renewal_count(&self) -> u64 {
        self.renewals.load(Ordering::Relaxed)
    }

    /// Time left until the next scheduled renewal.
    pub fn time_until_renewal(&self) -> Duration {
        let renew_at = self.state.read().renew_at;
        renew_at.saturating_duration_since(Instant::now())
    }
}

impl TokenSource for TokenManager {
    fn current_token(&self) -> Arc<str> {
        Arc::clone(&self.state.read().token)
    }
}
