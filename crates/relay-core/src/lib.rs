//! # relay-core
//!
//! Foundation types and shared plumbing for the relay bridge.
//!
//! - **Branded IDs**: [`ids::SessionId`], [`ids::SubscriptionId`] as newtypes
//! - **Wire messages**: [`messages::SessionMessage`] sent to connected sessions
//! - **HTTP**: [`http::build_client`] with configurable TLS verification
//! - **Logging**: [`logging::init_subscriber`] for `tracing-subscriber` setup
//! - **Text**: [`text::redact`] for logging secrets safely
//! - **Metrics**: [`metric_names`] shared across crates
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other relay crates.

#![deny(unsafe_code)]

pub mod http;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod metric_names;
pub mod text;

pub use ids::{SessionId, SubscriptionId};
pub use messages::SessionMessage;
