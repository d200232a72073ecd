//! # relay-auth
//!
//! Keeps the bridge's bearer token valid for as long as the process runs.
//!
//! - [`ClientCredentialsProvider`]: OAuth 2.0 client-credentials exchange
//!   against the identity provider's token endpoint
//! - [`TokenManager`]: holds the current token, renews it on the schedule the
//!   provider dictates (`expires_in`), and surfaces renewal failure as a fatal
//!   error through the renewal task's join handle
//! - [`TokenSource`]: the read-only view other crates depend on
//!
//! A bridge that cannot authenticate must not keep serving, so every renewal
//! failure ends the renewal task with an [`AuthError`]; the supervisor in
//! `relay-agent` turns that into a process exit.

#![deny(unsafe_code)]

pub mod client_credentials;
pub mod errors;
pub mod manager;
pub mod types;

pub use client_credentials::ClientCredentialsProvider;
pub use errors::AuthError;
pub use manager::{RenewalHandle, StaticToken, TokenManager, TokenSource};
pub use types::{IssuedToken, TokenProvider, parse_expires_in, renewal_delay};
