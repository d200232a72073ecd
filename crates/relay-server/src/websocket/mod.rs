//! WebSocket sessions.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Upgrade, per-connection read/write loops, teardown |
//! | `directory` | Live sessions and their outbound queues; slow-client eviction |
//! | `frames` | Client frame parsing and request dispatch to the registry |
//!
//! ## Data Flow
//!
//! client frame → `frames::dispatch` → registry → reply on the session queue.
//! Router → `directory` (as `SessionDelivery`) → session queue → client.

pub mod connection;
pub mod directory;
pub mod frames;

pub use connection::ws_handler;
pub use directory::{SessionDirectory, SessionHandle};
