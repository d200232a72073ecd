//! WebSocket upgrade and per-connection loops.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use relay_core::metric_names::WS_CONNECTIONS_TOTAL;
use relay_core::{SessionId, SessionMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::directory::SessionHandle;
use super::frames;
use crate::server::AppState;

/// `GET {wsPath}`: upgrade to a session.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Run one session from greeting to teardown.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let _connection = state.connections.token();
    let session_id = SessionId::generate();
    let started = Instant::now();
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(state.session_capacity.max(1));
    let handle = Arc::new(SessionHandle::new(session_id.clone(), tx));
    state.sessions.add(Arc::clone(&handle));
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    info!(session_id = %session_id, "client connected");

    let (mut sink, mut stream) = socket.split();

    // Writer: drains the session queue into the socket.
    let writer = tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if sink.send(Message::Text(String::from(json.as_str()).into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let _ = reply_to(&handle, &state, &SessionMessage::session_id(&session_id)).await;

    loop {
        tokio::select! {
            () = handle.evicted() => {
                debug!(session_id = %session_id, "session evicted");
                break;
            }
            () = state.shutdown.cancelled() => {
                debug!(session_id = %session_id, "server shutting down");
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let reply = frames::dispatch(&state.registry, &session_id, text.as_str()).await;
                    if !reply_to(&handle, &state, &reply).await {
                        break;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    let reply = SessionMessage::error("Invalid message: binary frames are not supported");
                    if !reply_to(&handle, &state, &reply).await {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(e)) => {
                    debug!(session_id = %session_id, error = %e, "websocket read error");
                    break;
                }
            }
        }
    }

    let _ = state.sessions.remove(&session_id);
    drop(handle);
    writer.abort();

    let clean = state.registry.disconnect(&session_id).await;
    if clean {
        info!(session_id = %session_id, duration_secs = started.elapsed().as_secs(), "client disconnected successfully");
    } else {
        warn!(session_id = %session_id, duration_secs = started.elapsed().as_secs(), "client unsuccessfully disconnected");
    }
}

/// Queue a reply unless the session is evicted or the server stops first.
async fn reply_to(handle: &SessionHandle, state: &AppState, reply: &SessionMessage) -> bool {
    tokio::select! {
        sent = handle.send(reply) => sent,
        () = state.shutdown.cancelled() => false,
    }
}
