//! Shared library modules for the `relay` binary and its tests.
//!
//! `main.rs` parses the command line and supervises the process; the wiring
//! of settings, token manager, gateway, registry, and server lives here.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod cli;
