//! Health and introspection endpoints.

use axum::Json;
use axum::extract::State;
use relay_runtime::Subscription;
use serde::Serialize;

use crate::server::AppState;

/// `GET /health` body.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always `"ok"` while the server answers.
    pub status: &'static str,
    /// Connected WebSocket sessions.
    pub sessions: usize,
    /// Registered subscriptions.
    pub subscriptions: usize,
}

/// `GET /health`.
pub async fn health_handler(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        sessions: state.sessions.len(),
        subscriptions: state.registry.len(),
    })
}

/// `GET /subscriptions`: registry snapshot, oldest first.
pub async fn subscriptions_handler(State(state): State<AppState>) -> Json<Vec<Subscription>> {
    Json(state.registry.snapshot())
}
