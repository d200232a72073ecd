//! # relay-settings
//!
//! Configuration management with layered sources for the relay bridge.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`RelaySettings::default()`]
//! 2. **Settings file** — `--settings <path>` or `~/.relay/settings.json`
//!    (deep-merged over defaults; a missing file is not an error)
//! 3. **Environment variables** — `RELAY_*` overrides (highest priority)
//!
//! After merging, [`RelaySettings::validate`] corrects out-of-range values
//! and [`RelaySettings::require_credentials`] rejects configurations that
//! cannot authenticate against the identity provider.
//!
//! # Usage
//!
//! ```no_run
//! use relay_settings::load_settings;
//!
//! let settings = load_settings().unwrap();
//! println!("listening on {}:{}", settings.server.host, settings.server.port);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::*;
