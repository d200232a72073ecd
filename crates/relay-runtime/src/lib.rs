//! # relay-runtime
//!
//! The stateful core of the bridge.
//!
//! - [`SubscriptionRegistry`]: owns the subscription map and the
//!   session → subscriptions index; drives the broker gateway on register,
//!   unregister, and session disconnect
//! - [`NotificationRouter`]: resolves the owner of an inbound notification and
//!   hands it to a [`SessionDelivery`]
//! - [`SessionDelivery`]: the seam to the transport layer
//!
//! ## Locking
//!
//! One `parking_lot::Mutex` guards the map and the index together. It is
//! never held across a broker call.

#![deny(unsafe_code)]

pub mod delivery;
pub mod errors;
pub mod registry;
pub mod router;
pub mod types;

pub use delivery::SessionDelivery;
pub use errors::{DenialReason, RegisterError, UnregisterError};
pub use registry::SubscriptionRegistry;
pub use router::{NotificationRouter, RouteOutcome};
pub use types::{RegisterRequest, Subscription};
