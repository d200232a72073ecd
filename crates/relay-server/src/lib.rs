//! # relay-server
//!
//! Network surface of the bridge.
//!
//! - **WebSocket** (`websocket`): one session per connection; `register` and
//!   `unregister` frames drive the subscription registry, notifications are
//!   pushed through the [`websocket::SessionDirectory`]
//! - **Notification receiver** (`notifications`): the broker's callback
//!   endpoint, feeding the notification router
//! - **Ops** (`health`, `metrics`): health, Prometheus metrics, and a
//!   read-only subscription listing
//!
//! [`server::build_router`] assembles the axum router; [`server::serve`]
//! runs it until the shutdown token fires.

#![deny(unsafe_code)]

pub mod errors;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod server;
pub mod websocket;

pub use errors::ServerError;
pub use server::{AppState, build_router, drain_connections, serve};
pub use websocket::SessionDirectory;
