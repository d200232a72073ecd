//! Broker callback endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use relay_broker::ngsi::NotifyContextRequest;
use relay_core::SubscriptionId;
use tracing::{debug, warn};

use crate::server::AppState;

/// `POST {notificationPath}`: route a broker notification.
///
/// Answers `200` with the request body echoed whether or not a session owns
/// the subscription, so the broker never retries. Payloads without a
/// `subscriptionId` or any `contextResponses` are rejected with `400`.
pub async fn receive_notification(State(state): State<AppState>, body: Bytes) -> Response {
    let notification: NotifyContextRequest = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "malformed notification");
            return (StatusCode::BAD_REQUEST, format!("malformed notification: {e}")).into_response();
        }
    };
    let Some(element) = notification.first_element().cloned() else {
        warn!(subscription_id = %notification.subscription_id, "notification without context elements");
        return (StatusCode::BAD_REQUEST, "notification carries no contextResponses").into_response();
    };

    let subscription_id = SubscriptionId::new(notification.subscription_id);
    let outcome = state.router.route(&subscription_id, element).await;
    debug!(subscription_id = %subscription_id, outcome = outcome.as_str(), "notification handled");

    (StatusCode::OK, [(CONTENT_TYPE, "application/json")], body).into_response()
}
