//! Router assembly and the serve loop.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use relay_runtime::{NotificationRouter, SubscriptionRegistry};
use relay_settings::ServerSettings;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::errors::ServerError;
use crate::health::{health_handler, subscriptions_handler};
use crate::metrics::metrics_handler;
use crate::notifications::receive_notification;
use crate::websocket::{SessionDirectory, ws_handler};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Subscription registry.
    pub registry: Arc<SubscriptionRegistry>,
    /// Notification router.
    pub router: Arc<NotificationRouter>,
    /// Live WebSocket sessions.
    pub sessions: Arc<SessionDirectory>,
    /// Prometheus handle; `/metrics` answers 503 without one.
    pub metrics: Option<PrometheusHandle>,
    /// Outbound queue depth per session.
    pub session_capacity: usize,
    /// Fires on shutdown; open sessions close and tear down.
    pub shutdown: CancellationToken,
    /// Open WebSocket connections, each held until its teardown finishes.
    pub connections: TaskTracker,
}

/// Build the axum router.
pub fn build_router(state: AppState, settings: &ServerSettings) -> Router {
    Router::new()
        .route(&settings.ws_path, get(ws_handler))
        .route(&settings.notification_path, post(receive_notification))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/subscriptions", get(subscriptions_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(settings.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Bind the configured address.
pub async fn bind(settings: &ServerSettings) -> Result<TcpListener, ServerError> {
    let addr = settings.bind_addr();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Wait for every open connection to finish its teardown.
///
/// Returns `false` if some were still running after `timeout`.
pub async fn drain_connections(connections: &TaskTracker, timeout: Duration) -> bool {
    let _ = connections.close();
    if tokio::time::timeout(timeout, connections.wait()).await.is_ok() {
        return true;
    }
    warn!(open = connections.len(), "connections still tearing down");
    false
}

/// Serve until `shutdown` fires and in-flight requests finish.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "relay listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("server stopped");
    Ok(())
}
