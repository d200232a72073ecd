//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;
use relay_settings::RelaySettings;

/// Orion subscription bridge.
#[derive(Debug, Parser)]
#[command(name = "relay", version, about)]
pub struct Cli {
    /// Settings file (defaults to `~/.relay/settings.json`).
    #[arg(long, env = "RELAY_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Listen port, overriding the settings file.
    #[arg(long)]
    pub port: Option<u16>,

    /// Log level (`trace`, `debug`, `info`, `warn`, `error`). `RUST_LOG` wins.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut RelaySettings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        if self.json_logs {
            settings.logging.json = true;
        }
    }

    /// Settings file to read.
    pub fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(relay_settings::settings_path)
    }
}
