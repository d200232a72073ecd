//! Settings loading: defaults → file → environment.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{Result, SettingsError};
use crate::types::RelaySettings;

/// Default settings file location: `~/.relay/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(".relay").join("settings.json")
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<RelaySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path`, deep-merged over defaults, with `RELAY_*`
/// environment overrides applied and values validated.
///
/// A missing file yields defaults (plus env overrides).
pub fn load_settings_from_path(path: &Path) -> Result<RelaySettings> {
    let mut settings = read_layered(path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.validate();
    Ok(settings)
}

fn read_layered(path: &Path) -> Result<RelaySettings> {
    let defaults = serde_json::to_value(RelaySettings::default())?;
    let file = match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<Value>(&raw)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(?path, "no settings file, using defaults");
            return Ok(serde_json::from_value(defaults)?);
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    tracing::info!(?path, "loaded settings file");
    Ok(serde_json::from_value(deep_merge(defaults, file))?)
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key and `null` overlay values are skipped; any other
/// overlay value (including arrays) replaces the base value.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    continue;
                }
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, overlay) => overlay,
    }
}

/// Apply `RELAY_*` overrides using `lookup` to read variables.
///
/// Unparseable numeric or boolean values are ignored with a warning.
pub fn apply_env_overrides(settings: &mut RelaySettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("RELAY_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = lookup("RELAY_PORT") {
        match v.parse() {
            Ok(port) => settings.server.port = port,
            Err(_) => tracing::warn!(value = %v, "ignoring invalid RELAY_PORT"),
        }
    }
    if let Some(v) = lookup("RELAY_BROKER_URL") {
        settings.broker.url = v;
    }
    if let Some(v) = lookup("RELAY_CALLBACK_URL") {
        settings.broker.callback_url = v;
    }
    if let Some(v) = lookup("RELAY_TOKEN_URL") {
        settings.identity.token_url = v;
    }
    if let Some(v) = lookup("RELAY_CLIENT_ID") {
        settings.identity.client_id = v;
    }
    if let Some(v) = lookup("RELAY_CLIENT_SECRET") {
        settings.identity.client_secret = v;
    }
    if let Some(v) = lookup("RELAY_TLS_ACCEPT_INVALID_CERTS") {
        match parse_bool(&v) {
            Some(b) => settings.tls.accept_invalid_certs = b,
            None => tracing::warn!(value = %v, "ignoring invalid RELAY_TLS_ACCEPT_INVALID_CERTS"),
        }
    }
    if let Some(v) = lookup("RELAY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = lookup("RELAY_LOG_JSON") {
        match parse_bool(&v) {
            Some(b) => settings.logging.json = b,
            None => tracing::warn!(value = %v, "ignoring invalid RELAY_LOG_JSON"),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
