//! # relay-broker
//!
//! Request/response gateway to the context broker.
//!
//! - [`BrokerGateway`]: the seam the subscription registry calls through
//! - [`OrionGateway`]: `reqwest` implementation speaking NGSI to an Orion
//!   broker (`/v2/entities` for lookup, `/v1/subscribeContext` and
//!   `/v1/unsubscribeContext` for subscriptions)
//!
//! The gateway holds no token. Every call takes the current bearer token as
//! an argument so renewals are picked up without coordination.

#![deny(unsafe_code)]

pub mod errors;
pub mod gateway;
pub mod ngsi;
pub mod orion;
pub mod types;

pub use errors::GatewayError;
pub use gateway::BrokerGateway;
pub use orion::{OrionConfig, OrionGateway};
pub use types::{EntityDescriptor, SubscribeOptions};
