//! Component wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusHandle;
use relay_auth::{ClientCredentialsProvider, RenewalHandle, TokenManager, TokenProvider, TokenSource};
use relay_broker::{BrokerGateway, OrionConfig, OrionGateway};
use relay_core::http::{HttpClientOptions, build_client};
use relay_runtime::{NotificationRouter, SessionDelivery, SubscriptionRegistry};
use relay_server::{AppState, SessionDirectory};
use relay_settings::{RelaySettings, TlsSettings};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;

use crate::cli::Cli;

/// Load settings from the file the CLI names, then apply CLI overrides.
pub fn load(cli: &Cli) -> anyhow::Result<RelaySettings> {
    let path = cli.settings_path();
    let mut settings = relay_settings::load_settings_from_path(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    cli.apply(&mut settings);
    settings.validate();
    settings
        .require_credentials()
        .context("incomplete settings")?;
    Ok(settings)
}

fn client_options(timeout_secs: u64, tls: &TlsSettings) -> HttpClientOptions {
    HttpClientOptions {
        timeout: Duration::from_secs(timeout_secs),
        accept_invalid_certs: tls.accept_invalid_certs,
        ca_cert_path: tls.ca_cert_path.clone(),
    }
}

/// Perform the initial token exchange and spawn renewal.
pub async fn start_tokens(
    settings: &RelaySettings,
    cancel: CancellationToken,
) -> anyhow::Result<(Arc<TokenManager>, RenewalHandle)> {
    let client = build_client(&client_options(
        settings.identity.request_timeout_secs,
        &settings.tls,
    ))
    .context("building identity provider client")?;
    let provider = ClientCredentialsProvider::from_settings(&settings.identity, client);
    info!(endpoint = provider.endpoint(), client_id = %settings.identity.client_id, "requesting access token");

    let fallback = Duration::from_secs(settings.identity.default_renewal_secs);
    TokenManager::start(Arc::new(provider) as Arc<dyn TokenProvider>, fallback, cancel)
        .await
        .context("initial token exchange failed")
}

/// Build the gateway, registry, router, and session directory.
pub fn build_state(
    settings: &RelaySettings,
    tokens: Arc<dyn TokenSource>,
    metrics: Option<PrometheusHandle>,
    shutdown: CancellationToken,
) -> anyhow::Result<AppState> {
    let client = build_client(&client_options(
        settings.broker.request_timeout_secs,
        &settings.tls,
    ))
    .context("building broker client")?;
    let gateway = OrionGateway::new(OrionConfig::from(&settings.broker), client);

    let registry = Arc::new(
        SubscriptionRegistry::new(Arc::new(gateway) as Arc<dyn BrokerGateway>, tokens)
            .with_default_duration(settings.broker.default_duration.clone()),
    );
    let sessions = Arc::new(SessionDirectory::new());
    let router = Arc::new(NotificationRouter::new(
        Arc::clone(&registry),
        Arc::clone(&sessions) as Arc<dyn SessionDelivery>,
    ));

    Ok(AppState {
        registry,
        router,
        sessions,
        metrics,
        session_capacity: settings.server.session_channel_capacity,
        shutdown,
        connections: TaskTracker::new(),
    })
}
